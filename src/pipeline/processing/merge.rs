use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::{Jurisdiction, JurisdictionMap};
use crate::observability::metrics;
use crate::registry::JurisdictionRegistry;
use crate::sources::{PartialMap, SourceOutput};

/// Counters describing what a merge did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub sources_merged: usize,
    pub failed_sources: Vec<FailedSource>,
    pub elections_added: usize,
    pub duplicate_elections: usize,
    pub unknown_codes: Vec<String>,
}

impl MergeStats {
    fn absorb(&mut self, other: MergeStats) {
        self.sources_merged += other.sources_merged;
        self.failed_sources.extend(other.failed_sources);
        self.elections_added += other.elections_added;
        self.duplicate_elections += other.duplicate_elections;
        self.unknown_codes.extend(other.unknown_codes);
    }
}

/// A source whose collection failed and contributed nothing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedSource {
    pub source: String,
    pub error: String,
}

/// Combines per-source partial maps into the canonical map.
///
/// Sources are applied in order. Scalar fields are last-write-wins, but an
/// empty incoming value never replaces a set one. Election lists only grow:
/// an incoming election is appended unless the jurisdiction already lists
/// one with an identical title. Applying the same source twice is a no-op.
#[derive(Debug, Clone, Copy)]
pub struct MergeEngine<'a> {
    registry: &'a JurisdictionRegistry,
}

impl<'a> MergeEngine<'a> {
    pub fn new(registry: &'a JurisdictionRegistry) -> Self {
        Self { registry }
    }

    /// One empty entry per registry code
    pub fn seed(&self) -> JurisdictionMap {
        self.registry
            .entries()
            .iter()
            .map(|e| (e.code.to_string(), Jurisdiction::empty(e.name)))
            .collect()
    }

    /// Fold every source into `seed`. A failed source is logged and merged as
    /// an empty map so the remaining sources still apply.
    pub fn merge<I>(&self, seed: JurisdictionMap, sources: I) -> (JurisdictionMap, MergeStats)
    where
        I: IntoIterator<Item = SourceOutput>,
    {
        let mut map = seed;
        let mut stats = MergeStats::default();

        for output in sources {
            let partial = match output.result {
                Ok(partial) => partial,
                Err(e) => {
                    warn!(source = %output.source, error = %e, "Source failed; merging it as empty");
                    metrics::merge::source_failed(&output.source);
                    stats.failed_sources.push(FailedSource {
                        source: output.source.clone(),
                        error: e.to_string(),
                    });
                    PartialMap::new()
                }
            };

            let source_stats = self.merge_source(&mut map, partial);
            debug!(
                source = %output.source,
                added = source_stats.elections_added,
                duplicates = source_stats.duplicate_elections,
                "Merged source"
            );
            stats.absorb(source_stats);
        }

        info!(
            sources = stats.sources_merged,
            failed = stats.failed_sources.len(),
            elections_added = stats.elections_added,
            duplicates = stats.duplicate_elections,
            "Merge complete"
        );
        (map, stats)
    }

    /// Apply one partial map on top of `map`
    pub fn merge_source(&self, map: &mut JurisdictionMap, partial: PartialMap) -> MergeStats {
        let mut stats = MergeStats {
            sources_merged: 1,
            ..MergeStats::default()
        };

        for (code, incoming) in partial {
            let Some(name) = self.registry.name_for_code(&code) else {
                warn!(code = %code, "Skipping data for unknown jurisdiction code");
                metrics::merge::unknown_code();
                stats.unknown_codes.push(code);
                continue;
            };

            let existing = map
                .entry(code)
                .or_insert_with(|| Jurisdiction::empty(name));

            overwrite_if_set(&mut existing.state_name, incoming.state_name);
            overwrite_if_set(&mut existing.registration_website, incoming.registration_website);
            overwrite_if_set(&mut existing.registration_deadline, incoming.registration_deadline);

            for election in incoming.elections {
                if existing.has_election_titled(&election.title) {
                    stats.duplicate_elections += 1;
                    continue;
                }
                existing.elections.push(election);
                stats.elections_added += 1;
            }
        }

        metrics::merge::elections_added(stats.elections_added);
        metrics::merge::duplicates_skipped(stats.duplicate_elections);
        stats
    }
}

fn overwrite_if_set(target: &mut String, incoming: String) {
    if !incoming.trim().is_empty() {
        *target = incoming;
    }
}
