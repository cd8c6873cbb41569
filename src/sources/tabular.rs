//! Spreadsheet-export sources.
//!
//! Two sheets feed the pipeline: the elections sheet (one row per state with
//! race columns) and the logistics sheet (registration website and deadline).
//! Both are read through [`TabularReader`] so tests can hand in rows directly.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::{ElectionSource, PartialMap, SourceError};
use crate::constants::{COL_STATE, ELECTIONS_SHEET_SOURCE, LOGISTICS_SHEET_SOURCE};
use crate::domain::Jurisdiction;
use crate::observability::metrics;
use crate::pipeline::processing::builder::{ElectionRecordBuilder, TabularRow};
use crate::pipeline::processing::deadline::DeadlineResolver;
use crate::registry::JurisdictionRegistry;

/// Yields the rows of one tabular file as header -> cell maps
pub trait TabularReader {
    fn rows(&self) -> Result<Vec<TabularRow>, SourceError>;
}

impl TabularReader for Vec<TabularRow> {
    fn rows(&self) -> Result<Vec<TabularRow>, SourceError> {
        Ok(self.clone())
    }
}

/// CSV export with a header row. Short rows are tolerated; missing cells
/// are simply absent from the row map.
#[derive(Debug, Clone)]
pub struct CsvTabularReader {
    path: PathBuf,
}

impl CsvTabularReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TabularReader for CsvTabularReader {
    fn rows(&self) -> Result<Vec<TabularRow>, SourceError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&self.path)?;

        let headers = reader.headers()?.clone();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let row: TabularRow = headers
                .iter()
                .zip(record.iter())
                .map(|(h, v)| (h.trim().to_string(), v.to_string()))
                .collect();
            rows.push(row);
        }

        debug!(path = %self.path.display(), rows = rows.len(), "Read CSV rows");
        Ok(rows)
    }
}

/// State cell of a row, or `None` when the row should be skipped silently
fn state_cell<'r>(row: &'r TabularRow, reserved_prefix: &str) -> Option<&'r str> {
    let state = row.get(COL_STATE)?.trim();
    if state.is_empty() || (!reserved_prefix.is_empty() && state.starts_with(reserved_prefix)) {
        return None;
    }
    Some(state)
}

/// The elections sheet: one row per state, race categories as columns
pub struct ElectionsSheetSource<'a, R> {
    reader: R,
    registry: &'a JurisdictionRegistry,
    builder: ElectionRecordBuilder<'a>,
    reserved_prefix: String,
}

impl<'a, R: TabularReader> ElectionsSheetSource<'a, R> {
    pub fn new(
        reader: R,
        registry: &'a JurisdictionRegistry,
        builder: ElectionRecordBuilder<'a>,
        reserved_prefix: impl Into<String>,
    ) -> Self {
        Self {
            reader,
            registry,
            builder,
            reserved_prefix: reserved_prefix.into(),
        }
    }
}

impl<R: TabularReader> ElectionSource for ElectionsSheetSource<'_, R> {
    fn name(&self) -> &str {
        ELECTIONS_SHEET_SOURCE
    }

    fn collect(&self) -> Result<PartialMap, SourceError> {
        let mut partial = PartialMap::new();
        let mut skipped = 0usize;

        for row in self.reader.rows()? {
            let Some(state) = state_cell(&row, &self.reserved_prefix) else {
                skipped += 1;
                continue;
            };
            let Some(code) = self.registry.code_for_name(state) else {
                warn!(state = %state, "Unknown state in elections sheet; skipping row");
                skipped += 1;
                continue;
            };
            let name = self.registry.name_for_code(code).unwrap_or(state);

            let elections = self.builder.build_from_row(&row);
            metrics::builder::elections_built(elections.len());

            partial
                .entry(code.to_string())
                .or_insert_with(|| Jurisdiction::empty(name))
                .elections
                .extend(elections);
        }

        metrics::sources::rows_skipped(skipped);
        Ok(partial)
    }
}

/// The logistics sheet: registration website and deadline per state
pub struct LogisticsSheetSource<'a, R> {
    reader: R,
    registry: &'a JurisdictionRegistry,
    builder: ElectionRecordBuilder<'a>,
    deadlines: DeadlineResolver<'a>,
    reserved_prefix: String,
}

impl<'a, R: TabularReader> LogisticsSheetSource<'a, R> {
    pub fn new(
        reader: R,
        registry: &'a JurisdictionRegistry,
        builder: ElectionRecordBuilder<'a>,
        deadlines: DeadlineResolver<'a>,
        reserved_prefix: impl Into<String>,
    ) -> Self {
        Self {
            reader,
            registry,
            builder,
            deadlines,
            reserved_prefix: reserved_prefix.into(),
        }
    }
}

impl<R: TabularReader> ElectionSource for LogisticsSheetSource<'_, R> {
    fn name(&self) -> &str {
        LOGISTICS_SHEET_SOURCE
    }

    fn collect(&self) -> Result<PartialMap, SourceError> {
        let mut partial = PartialMap::new();
        let mut skipped = 0usize;

        for row in self.reader.rows()? {
            let Some(state) = state_cell(&row, &self.reserved_prefix) else {
                skipped += 1;
                continue;
            };
            let Some(code) = self.registry.code_for_source_name(state) else {
                warn!(state = %state, "Unknown state in logistics sheet; skipping row");
                skipped += 1;
                continue;
            };
            let name = self.registry.name_for_code(code).unwrap_or_default();

            let info = self.builder.registration_from_row(&row);
            let mut jurisdiction = Jurisdiction::empty(name);
            jurisdiction.registration_website = info.website;
            jurisdiction.registration_deadline = self
                .deadlines
                .resolve(code, info.explicit_deadline.as_deref());

            partial.insert(code.to_string(), jurisdiction);
        }

        metrics::sources::rows_skipped(skipped);
        Ok(partial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ElectionCalendar;
    use crate::constants::{
        COL_CHECK_REGISTRATION, COL_GUBERNATORIAL, COL_HOUSE, COL_ONLINE_REGISTRATION,
        COL_REGISTRATION_DEADLINE,
    };
    use crate::domain::ElectionType;
    use crate::pipeline::processing::extract::CandidateExtractor;
    use std::io::Write;

    fn row(cells: &[(&str, &str)]) -> TabularRow {
        cells
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_elections_sheet_skips_blank_reserved_and_unknown_rows() {
        let registry = JurisdictionRegistry::new();
        let calendar = ElectionCalendar::default();
        let extractor = CandidateExtractor::default();
        let builder = ElectionRecordBuilder::new(&calendar, &extractor);

        let rows = vec![
            row(&[(COL_STATE, ""), (COL_GUBERNATORIAL, "YES")]),
            row(&[(COL_STATE, "**Notes"), (COL_GUBERNATORIAL, "YES")]),
            row(&[(COL_STATE, "Atlantis"), (COL_GUBERNATORIAL, "YES")]),
            row(&[(COL_STATE, "Virginia"), (COL_GUBERNATORIAL, "YES")]),
            row(&[(COL_STATE, "Texas"), (COL_HOUSE, "District 18 (11/15)")]),
        ];
        let source = ElectionsSheetSource::new(rows, &registry, builder, "**");
        let partial = source.collect().unwrap();

        assert_eq!(partial.len(), 2);
        assert_eq!(partial["VA"].state_name, "Virginia");
        assert_eq!(partial["VA"].elections[0].title, "Governor");
        let house = &partial["TX"].elections[0];
        assert_eq!(house.election_type, ElectionType::Special);
        assert_eq!(house.date, "November 15, 2025");
    }

    #[test]
    fn test_logistics_sheet_cleans_names_and_resolves_deadlines() {
        let registry = JurisdictionRegistry::new();
        let calendar = ElectionCalendar::default();
        let extractor = CandidateExtractor::default();
        let builder = ElectionRecordBuilder::new(&calendar, &extractor);
        let deadlines = DeadlineResolver::new(&calendar);

        let rows = vec![
            row(&[
                (COL_STATE, "New Jersey*"),
                (COL_REGISTRATION_DEADLINE, "October 14, 2025"),
                (COL_ONLINE_REGISTRATION, "No"),
                (COL_CHECK_REGISTRATION, "https://voter.svrs.nj.gov/registration-check"),
            ]),
            row(&[(COL_STATE, "DC (Washington)"), (COL_ONLINE_REGISTRATION, "https://vote.dc.gov")]),
        ];
        let source = LogisticsSheetSource::new(rows, &registry, builder, deadlines, "**");
        let partial = source.collect().unwrap();

        let nj = &partial["NJ"];
        assert_eq!(nj.state_name, "New Jersey");
        assert_eq!(nj.registration_website, "https://voter.svrs.nj.gov/registration-check");
        assert_eq!(nj.registration_deadline, "October 14, 2025");

        let dc = &partial["DC"];
        assert_eq!(dc.registration_website, "https://vote.dc.gov");
        assert_eq!(dc.registration_deadline, "October 05, 2025");
        assert!(dc.elections.is_empty());
    }

    #[test]
    fn test_csv_reader_maps_headers_to_cells() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "State,Gubernatorial?,House of Reps?").unwrap();
        writeln!(file, "Virginia,YES,N/A").unwrap();
        writeln!(file, "\"New Jersey\",YES").unwrap();

        let rows = CsvTabularReader::new(file.path()).rows().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["State"], "Virginia");
        assert_eq!(rows[0]["House of Reps?"], "N/A");
        assert_eq!(rows[1]["State"], "New Jersey");
        assert!(!rows[1].contains_key("House of Reps?"));
    }

    #[test]
    fn test_missing_csv_is_a_source_error() {
        let reader = CsvTabularReader::new("/nonexistent/elections.csv");
        assert!(reader.rows().is_err());
    }
}
