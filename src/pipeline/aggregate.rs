use serde::Serialize;
use std::time::Instant;
use tracing::{error, info, info_span, warn};
use uuid::Uuid;

use crate::config::ElectionCalendar;
use crate::error::{AggregatorError, Result};
use crate::pipeline::processing::deadline::DeadlineResolver;
use crate::pipeline::processing::merge::{FailedSource, MergeEngine};
use crate::pipeline::processing::validate::Validator;
use crate::registry::JurisdictionRegistry;
use crate::sources::{run_source, DefaultsSource, ElectionSource};
use crate::store::{DocumentCounts, DocumentManager, DocumentStore};

#[derive(Debug, Clone, Copy, Default)]
pub struct AggregationOptions {
    /// Build and validate, but do not write the document
    pub dry_run: bool,
    /// Write even when validation reports violations
    pub force: bool,
}

/// Result of a complete aggregation run
#[derive(Debug, Clone, Serialize)]
pub struct AggregationReport {
    pub run_id: Uuid,
    pub sources_succeeded: Vec<String>,
    pub sources_failed: Vec<FailedSource>,
    pub jurisdictions: usize,
    pub elections: usize,
    pub candidates: usize,
    pub duplicate_elections: usize,
    pub violations: Vec<String>,
    pub persisted: bool,
    pub duration_secs: f64,
}

/// Sources -> merge -> validate -> persist.
///
/// A defaults source (registry URL and fallback deadline per jurisdiction)
/// always runs first, then the given sources in order. Source failures are
/// recorded in the report and never abort the run; validation violations do,
/// unless `force` is set.
pub struct AggregationPipeline<'a, S> {
    registry: &'a JurisdictionRegistry,
    calendar: &'a ElectionCalendar,
    manager: DocumentManager<S>,
    options: AggregationOptions,
}

impl<'a, S: DocumentStore> AggregationPipeline<'a, S> {
    pub fn new(
        registry: &'a JurisdictionRegistry,
        calendar: &'a ElectionCalendar,
        manager: DocumentManager<S>,
        options: AggregationOptions,
    ) -> Self {
        Self {
            registry,
            calendar,
            manager,
            options,
        }
    }

    pub fn manager(&self) -> &DocumentManager<S> {
        &self.manager
    }

    pub fn run(&self, sources: &[&dyn ElectionSource]) -> Result<AggregationReport> {
        let run_id = Uuid::new_v4();
        let span = info_span!("aggregate", run_id = %run_id);
        let _guard = span.enter();
        let started = Instant::now();

        info!(
            sources = sources.len(),
            dry_run = self.options.dry_run,
            force = self.options.force,
            "Starting aggregation run"
        );

        let defaults = DefaultsSource::new(self.registry, DeadlineResolver::new(self.calendar));
        let mut outputs = vec![run_source(&defaults)];
        outputs.extend(sources.iter().map(|source| run_source(*source)));
        let sources_succeeded: Vec<String> = outputs
            .iter()
            .filter(|o| o.is_ok())
            .map(|o| o.source.clone())
            .collect();

        let engine = MergeEngine::new(self.registry);
        let (map, stats) = engine.merge(engine.seed(), outputs);

        // entries without fresh data are carried over untouched, malformed or not
        let existing = self.manager.load()?;
        let document = self.manager.apply_merge(existing, map)?;

        let violations: Vec<String> = match Validator::with_registry(self.registry).validate(&document) {
            Ok(()) => Vec::new(),
            Err(violations) => violations.iter().map(ToString::to_string).collect(),
        };
        if !violations.is_empty() {
            for violation in &violations {
                error!(violation = %violation, "Validation violation");
            }
            if !self.options.force {
                return Err(AggregatorError::ValidationFailed {
                    count: violations.len(),
                });
            }
            warn!(count = violations.len(), "Persisting despite violations (--force)");
        }

        let persisted = if self.options.dry_run {
            info!("Dry run; document not written");
            false
        } else {
            self.manager.save(&document)?;
            true
        };

        let counts = DocumentCounts::of(&document);
        let report = AggregationReport {
            run_id,
            sources_succeeded,
            sources_failed: stats.failed_sources,
            jurisdictions: counts.jurisdictions,
            elections: counts.elections,
            candidates: counts.candidates,
            duplicate_elections: stats.duplicate_elections,
            violations,
            persisted,
            duration_secs: started.elapsed().as_secs_f64(),
        };
        info!(
            jurisdictions = report.jurisdictions,
            elections = report.elections,
            candidates = report.candidates,
            failed_sources = report.sources_failed.len(),
            persisted = report.persisted,
            "Aggregation run finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Jurisdiction;
    use crate::sources::{PartialMap, SourceError};
    use crate::store::InMemoryDocumentStore;
    use serde_json::json;

    struct Fixed(&'static str, PartialMap);

    impl ElectionSource for Fixed {
        fn name(&self) -> &str {
            self.0
        }

        fn collect(&self) -> std::result::Result<PartialMap, SourceError> {
            Ok(self.1.clone())
        }
    }

    struct Offline;

    impl ElectionSource for Offline {
        fn name(&self) -> &str {
            "offline"
        }

        fn collect(&self) -> std::result::Result<PartialMap, SourceError> {
            Err(SourceError::Unavailable("offline".to_string()))
        }
    }

    fn pipeline<'a>(
        registry: &'a JurisdictionRegistry,
        calendar: &'a ElectionCalendar,
        store: InMemoryDocumentStore,
        options: AggregationOptions,
    ) -> AggregationPipeline<'a, InMemoryDocumentStore> {
        AggregationPipeline::new(registry, calendar, DocumentManager::new(store), options)
    }

    #[test]
    fn test_run_persists_full_coverage_and_reports_failures() {
        let registry = JurisdictionRegistry::new();
        let calendar = ElectionCalendar::default();
        let existing = json!({
            "lastUpdated": "",
            "contactEmail": "team@example.org",
            "electionData": {}
        });
        let pipeline = pipeline(
            &registry,
            &calendar,
            InMemoryDocumentStore::with_document(existing),
            AggregationOptions::default(),
        );

        let mut nj = Jurisdiction::empty("New Jersey");
        nj.registration_deadline = "October 14, 2025".to_string();
        let logistics = Fixed("logistics", PartialMap::from([("NJ".to_string(), nj)]));

        let report = pipeline.run(&[&Offline, &logistics]).unwrap();

        assert!(report.persisted);
        assert_eq!(report.jurisdictions, 51);
        assert_eq!(report.sources_succeeded, vec!["defaults", "logistics"]);
        assert_eq!(report.sources_failed.len(), 1);
        assert_eq!(report.sources_failed[0].source, "offline");

        let saved = pipeline.manager().store().snapshot().unwrap();
        assert_eq!(saved["contactEmail"], "team@example.org");
        assert_eq!(saved["electionData"]["NJ"]["registrationDeadline"], "October 14, 2025");
        assert_eq!(saved["electionData"]["VA"]["registrationDeadline"], "October 05, 2025");
        assert_ne!(saved["lastUpdated"], "");
    }

    /// A non-registry entry missing `elections` that no source overwrites
    fn existing_with_broken_guam() -> serde_json::Value {
        json!({
            "lastUpdated": "",
            "electionData": {
                "GU": {
                    "stateName": "Guam",
                    "registrationWebsite": "",
                    "registrationDeadline": ""
                }
            }
        })
    }

    #[test]
    fn test_leftover_violation_blocks_save_without_force() {
        let registry = JurisdictionRegistry::new();
        let calendar = ElectionCalendar::default();
        let existing = existing_with_broken_guam();
        let pipeline = pipeline(
            &registry,
            &calendar,
            InMemoryDocumentStore::with_document(existing.clone()),
            AggregationOptions::default(),
        );

        let result = pipeline.run(&[]);

        assert!(matches!(result, Err(AggregatorError::ValidationFailed { count: 1 })));
        assert_eq!(pipeline.manager().store().snapshot(), Some(existing));
    }

    #[test]
    fn test_force_persists_despite_violation() {
        let registry = JurisdictionRegistry::new();
        let calendar = ElectionCalendar::default();
        let pipeline = pipeline(
            &registry,
            &calendar,
            InMemoryDocumentStore::with_document(existing_with_broken_guam()),
            AggregationOptions {
                dry_run: false,
                force: true,
            },
        );

        let report = pipeline.run(&[]).unwrap();

        assert!(report.persisted);
        assert_eq!(report.jurisdictions, 52);
        assert_eq!(report.violations.len(), 1);
        assert!(report.violations[0].contains("GU"));
        assert!(report.violations[0].contains("missing `elections`"));
        let saved = pipeline.manager().store().snapshot().unwrap();
        assert_eq!(saved["electionData"]["GU"]["stateName"], "Guam");
        assert_eq!(saved["electionData"]["VA"]["stateName"], "Virginia");
    }

    #[test]
    fn test_dry_run_does_not_write() {
        let registry = JurisdictionRegistry::new();
        let calendar = ElectionCalendar::default();
        let pipeline = pipeline(
            &registry,
            &calendar,
            InMemoryDocumentStore::default(),
            AggregationOptions {
                dry_run: true,
                force: false,
            },
        );

        let report = pipeline.run(&[]).unwrap();
        assert!(!report.persisted);
        assert!(report.violations.is_empty());
        assert!(pipeline.manager().store().snapshot().is_none());
    }
}
