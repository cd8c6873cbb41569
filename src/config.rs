use chrono::NaiveDate;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::constants::{DEFAULT_RESERVED_ROW_PREFIX, ELECTION_DATE_FORMAT};
use crate::error::{AggregatorError, Result};

/// Environment variable overriding `[document] path`
pub const DOCUMENT_PATH_ENV: &str = "ELECTIONS_DOCUMENT_PATH";

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Largest accepted `registration_offset_days`
pub const MAX_REGISTRATION_OFFSET_DAYS: i64 = 366;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub election: ElectionSettings,
    pub document: DocumentSettings,
    pub sources: SourceSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ElectionSettings {
    pub general_election_date: NaiveDate,
    pub registration_offset_days: i64,
    pub special_dates: Vec<SpecialDate>,
}

/// Bracketed marker in raw text that moves an election off the general date
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SpecialDate {
    /// Literal marker, e.g. `(12/02)`
    pub token: String,
    /// Date written into the election, e.g. `December 2, 2025`
    pub date: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DocumentSettings {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    pub reserved_row_prefix: String,
    /// URL with `{code}` / `{state}` placeholders for the HTTP page fetcher
    pub page_url_template: Option<String>,
    pub page_timeout_secs: u64,
}

impl Default for ElectionSettings {
    fn default() -> Self {
        Self {
            general_election_date: NaiveDate::from_ymd_opt(2025, 11, 4)
                .expect("2025-11-04 is a valid date"),
            registration_offset_days: 30,
            special_dates: vec![
                SpecialDate {
                    token: "(12/02)".to_string(),
                    date: "December 2, 2025".to_string(),
                },
                SpecialDate {
                    token: "(11/15)".to_string(),
                    date: "November 15, 2025".to_string(),
                },
                SpecialDate {
                    token: "(12/09)".to_string(),
                    date: "December 9, 2025".to_string(),
                },
            ],
        }
    }
}

impl Default for DocumentSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("docs/elections.json"),
        }
    }
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            reserved_row_prefix: DEFAULT_RESERVED_ROW_PREFIX.to_string(),
            page_url_template: None,
            page_timeout_secs: 30,
        }
    }
}

impl Config {
    /// Load configuration from `path` (or `config.toml`), falling back to
    /// defaults when the default file is absent. An explicitly named file must
    /// exist. Environment overrides are applied last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_PATH))?
            }
            None => {
                debug!("No {} found, using built-in defaults", DEFAULT_CONFIG_PATH);
                Self::default()
            }
        };

        if let Ok(doc_path) = std::env::var(DOCUMENT_PATH_ENV) {
            info!(path = %doc_path, "Document path overridden from environment");
            config.document.path = PathBuf::from(doc_path);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            AggregatorError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let offset = self.election.registration_offset_days;
        if !(0..=MAX_REGISTRATION_OFFSET_DAYS).contains(&offset) {
            return Err(AggregatorError::Config(format!(
                "registration_offset_days must be between 0 and {}, got {}",
                MAX_REGISTRATION_OFFSET_DAYS, offset
            )));
        }
        if let Some(bad) = self
            .election
            .special_dates
            .iter()
            .find(|s| s.token.trim().is_empty() || s.date.trim().is_empty())
        {
            return Err(AggregatorError::Config(format!(
                "special date entry {:?} needs both a token and a date",
                bad
            )));
        }
        Ok(())
    }

    pub fn calendar(&self) -> ElectionCalendar {
        ElectionCalendar {
            general_election_date: self.election.general_election_date,
            registration_offset_days: self.election.registration_offset_days,
            special_dates: self.election.special_dates.clone(),
        }
    }
}

/// Immutable date settings shared by the builder and the deadline resolver
#[derive(Debug, Clone)]
pub struct ElectionCalendar {
    pub general_election_date: NaiveDate,
    pub registration_offset_days: i64,
    pub special_dates: Vec<SpecialDate>,
}

impl Default for ElectionCalendar {
    fn default() -> Self {
        Config::default().calendar()
    }
}

impl ElectionCalendar {
    /// The general election date as written into elections ("November 4, 2025")
    pub fn default_election_date(&self) -> String {
        self.general_election_date
            .format(ELECTION_DATE_FORMAT)
            .to_string()
    }

    /// First configured special-date marker occurring in `text`
    pub fn special_date_in(&self, text: &str) -> Option<&SpecialDate> {
        self.special_dates.iter().find(|s| text.contains(&s.token))
    }

    /// Remove every configured marker from `text` and trim the result
    pub fn strip_special_dates(&self, text: &str) -> String {
        let mut out = text.to_string();
        for special in &self.special_dates {
            out = out.replace(&special.token, "");
        }
        out.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_2025_cycle() {
        let calendar = ElectionCalendar::default();
        assert_eq!(calendar.default_election_date(), "November 4, 2025");
        assert_eq!(calendar.registration_offset_days, 30);
        assert_eq!(calendar.special_dates.len(), 3);
    }

    #[test]
    fn test_partial_toml_keeps_other_defaults() {
        let config = Config::from_toml_str(
            r#"
            [election]
            general_election_date = "2026-11-03"

            [document]
            path = "out/elections.json"
            "#,
        )
        .unwrap();

        assert_eq!(
            config.election.general_election_date,
            NaiveDate::from_ymd_opt(2026, 11, 3).unwrap()
        );
        assert_eq!(config.election.registration_offset_days, 30);
        assert_eq!(config.document.path, PathBuf::from("out/elections.json"));
        assert_eq!(config.sources.reserved_row_prefix, "**");
    }

    #[test]
    fn test_special_dates_from_toml() {
        let config = Config::from_toml_str(
            r#"
            [[election.special_dates]]
            token = "(01/13)"
            date = "January 13, 2026"
            "#,
        )
        .unwrap();

        let calendar = config.calendar();
        let special = calendar.special_date_in("District 7 (01/13)").unwrap();
        assert_eq!(special.date, "January 13, 2026");
        assert_eq!(calendar.strip_special_dates("District 7 (01/13)"), "District 7");
    }

    #[test]
    fn test_negative_offset_is_rejected() {
        let mut config = Config::default();
        config.election.registration_offset_days = -1;
        assert!(matches!(config.validate(), Err(AggregatorError::Config(_))));
    }

    #[test]
    fn test_example_config_matches_defaults() {
        let config = Config::from_toml_str(include_str!("../config.example.toml")).unwrap();
        let defaults = Config::default();
        assert_eq!(config.election.general_election_date, defaults.election.general_election_date);
        assert_eq!(config.election.special_dates, defaults.election.special_dates);
        assert_eq!(config.document.path, defaults.document.path);
        assert!(config.sources.page_url_template.is_none());
    }

    #[test]
    fn test_oversized_offset_is_rejected() {
        let config = Config::from_toml_str("[election]\nregistration_offset_days = 1000000000").unwrap();
        assert!(matches!(config.validate(), Err(AggregatorError::Config(_))));

        let mut config = Config::default();
        config.election.registration_offset_days = MAX_REGISTRATION_OFFSET_DAYS;
        assert!(config.validate().is_ok());
        config.election.registration_offset_days = MAX_REGISTRATION_OFFSET_DAYS + 1;
        assert!(config.validate().is_err());
    }
}
