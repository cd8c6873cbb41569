//! Phase-organized metrics for the aggregation pipeline
//!
//! Every metric is recorded through the `metrics` facade and named
//! `etw_{phase}_{name}`. No recorder is installed here; an embedding
//! application installs one if it wants the numbers exported.

/// Build a metric name following the `etw_{phase}_{name}` convention
macro_rules! phase_metric {
    (counter, $phase:literal, $name:literal) => {
        concat!("etw_", $phase, "_", $name, "_total")
    };
    (histogram, $phase:literal, $name:literal) => {
        concat!("etw_", $phase, "_", $name)
    };
}

/// Source collection
pub mod sources {
    pub fn collected(source: &str, jurisdictions: usize) {
        ::metrics::counter!(phase_metric!(counter, "sources", "collected"), "source" => source.to_string())
            .increment(1);
        ::metrics::histogram!(phase_metric!(histogram, "sources", "jurisdictions"))
            .record(jurisdictions as f64);
    }

    pub fn failed(source: &str) {
        ::metrics::counter!(phase_metric!(counter, "sources", "failed"), "source" => source.to_string())
            .increment(1);
    }

    /// Rows skipped because they were blank, reserved or named an unknown jurisdiction
    pub fn rows_skipped(count: usize) {
        ::metrics::counter!(phase_metric!(counter, "sources", "rows_skipped")).increment(count as u64);
    }

    pub fn pages_fetched() {
        ::metrics::counter!(phase_metric!(counter, "sources", "pages_fetched")).increment(1);
    }
}

/// Election record building
pub mod builder {
    pub fn elections_built(count: usize) {
        ::metrics::counter!(phase_metric!(counter, "builder", "elections_built"))
            .increment(count as u64);
    }

    pub fn candidates_extracted(count: usize) {
        ::metrics::counter!(phase_metric!(counter, "builder", "candidates_extracted"))
            .increment(count as u64);
    }
}

/// Merge engine
pub mod merge {
    pub fn source_failed(source: &str) {
        ::metrics::counter!(phase_metric!(counter, "merge", "sources_failed"), "source" => source.to_string())
            .increment(1);
    }

    pub fn unknown_code() {
        ::metrics::counter!(phase_metric!(counter, "merge", "unknown_codes")).increment(1);
    }

    pub fn elections_added(count: usize) {
        ::metrics::counter!(phase_metric!(counter, "merge", "elections_added"))
            .increment(count as u64);
    }

    pub fn duplicates_skipped(count: usize) {
        ::metrics::counter!(phase_metric!(counter, "merge", "duplicates_skipped"))
            .increment(count as u64);
    }
}

/// Document validation
pub mod validate {
    pub fn documents_checked() {
        ::metrics::counter!(phase_metric!(counter, "validate", "documents_checked")).increment(1);
    }

    pub fn violations_found(count: usize) {
        ::metrics::counter!(phase_metric!(counter, "validate", "violations"))
            .increment(count as u64);
    }
}

/// Document persistence
pub mod store {
    pub fn document_loaded(found: bool) {
        let outcome = if found { "found" } else { "missing" };
        ::metrics::counter!(phase_metric!(counter, "store", "loads"), "outcome" => outcome)
            .increment(1);
    }

    pub fn document_saved(bytes: usize) {
        ::metrics::counter!(phase_metric!(counter, "store", "saves")).increment(1);
        ::metrics::histogram!(phase_metric!(histogram, "store", "document_bytes"))
            .record(bytes as f64);
    }
}
