//! Election data sources.
//!
//! Each source reads one upstream input (a spreadsheet export, a set of
//! scraped pages) and turns it into a partial map keyed by jurisdiction code.
//! Sources never fail the pipeline: a failure is returned as
//! `Err(SourceError)` and the merge step treats it as an empty contribution.

pub mod pages;
pub mod tabular;

use thiserror::Error;
use tracing::{info, info_span, warn};

use crate::constants::DEFAULTS_SOURCE;
use crate::domain::{Jurisdiction, JurisdictionMap};
use crate::observability::metrics;
use crate::pipeline::processing::deadline::DeadlineResolver;
use crate::registry::JurisdictionRegistry;

pub use pages::{FilePageFetcher, HttpPageFetcher, PageFetcher, ScrapedPageSource};
pub use tabular::{CsvTabularReader, ElectionsSheetSource, LogisticsSheetSource, TabularReader};

/// Per-jurisdiction data contributed by a single source
pub type PartialMap = JurisdictionMap;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected content: {0}")]
    Content(String),

    #[error("Source unavailable: {0}")]
    Unavailable(String),
}

/// Anything that can contribute a partial map to the merge
pub trait ElectionSource {
    /// Stable name used in logs, metrics and the run report
    fn name(&self) -> &str;

    fn collect(&self) -> Result<PartialMap, SourceError>;
}

/// What one source produced, tagged with its name
#[derive(Debug)]
pub struct SourceOutput {
    pub source: String,
    pub result: Result<PartialMap, SourceError>,
}

impl SourceOutput {
    pub fn new(source: impl Into<String>, result: Result<PartialMap, SourceError>) -> Self {
        Self {
            source: source.into(),
            result,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Run a source inside its own span and record the outcome
pub fn run_source(source: &dyn ElectionSource) -> SourceOutput {
    let span = info_span!("source", source = %source.name());
    let _guard = span.enter();

    let result = source.collect();
    match &result {
        Ok(partial) => {
            let elections: usize = partial.values().map(|j| j.elections.len()).sum();
            info!(
                jurisdictions = partial.len(),
                elections = elections,
                "Source collected"
            );
            metrics::sources::collected(source.name(), partial.len());
        }
        Err(e) => {
            warn!(error = %e, "Source failed");
            metrics::sources::failed(source.name());
        }
    }
    SourceOutput::new(source.name(), result)
}

/// Baseline for every jurisdiction: the registry's default registration
/// website and the fallback deadline. Merged first so any real source
/// overrides it.
pub struct DefaultsSource<'a> {
    registry: &'a JurisdictionRegistry,
    deadlines: DeadlineResolver<'a>,
}

impl<'a> DefaultsSource<'a> {
    pub fn new(registry: &'a JurisdictionRegistry, deadlines: DeadlineResolver<'a>) -> Self {
        Self {
            registry,
            deadlines,
        }
    }
}

impl ElectionSource for DefaultsSource<'_> {
    fn name(&self) -> &str {
        DEFAULTS_SOURCE
    }

    fn collect(&self) -> Result<PartialMap, SourceError> {
        Ok(self
            .registry
            .entries()
            .iter()
            .map(|entry| {
                let mut jurisdiction = Jurisdiction::empty(entry.name);
                jurisdiction.registration_website = entry.default_registration_website.to_string();
                jurisdiction.registration_deadline = self.deadlines.resolve(entry.code, None);
                (entry.code.to_string(), jurisdiction)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ElectionCalendar;

    struct Broken;

    impl ElectionSource for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn collect(&self) -> Result<PartialMap, SourceError> {
            Err(SourceError::Unavailable("no input configured".to_string()))
        }
    }

    #[test]
    fn test_defaults_cover_every_jurisdiction() {
        let registry = JurisdictionRegistry::new();
        let calendar = ElectionCalendar::default();
        let source = DefaultsSource::new(&registry, DeadlineResolver::new(&calendar));

        let partial = source.collect().unwrap();
        assert_eq!(partial.len(), 51);
        let va = &partial["VA"];
        assert_eq!(va.state_name, "Virginia");
        assert!(va.registration_website.starts_with("http"));
        assert_eq!(va.registration_deadline, "October 05, 2025");
        assert!(va.elections.is_empty());
    }

    #[test]
    fn test_run_source_keeps_failure_as_value() {
        let output = run_source(&Broken);
        assert_eq!(output.source, "broken");
        assert!(!output.is_ok());
        assert!(matches!(output.result, Err(SourceError::Unavailable(_))));
    }
}
