use std::collections::HashMap;
use tracing::debug;

use crate::config::ElectionCalendar;
use crate::constants::{
    AFFIRMATIVE, COL_CHECK_REGISTRATION, COL_GUBERNATORIAL, COL_HOUSE, COL_ONLINE_REGISTRATION,
    COL_OTHER, COL_REFERENDUMS, COL_REGISTRATION_DEADLINE, GOVERNOR_STAKES, GOVERNOR_TITLE,
    HOUSE_TITLE_PREFIX, NOT_APPLICABLE, REFERENDUM_STAKES,
};
use crate::domain::{ChamberImpact, Election, ElectionType};
use crate::pipeline::processing::extract::CandidateExtractor;

/// One spreadsheet row as field name -> cell text
pub type TabularRow = HashMap<String, String>;

/// A heading from a scraped page and the text that follows it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapedSection {
    pub title: String,
    pub text: String,
}

/// Registration fields read from a logistics row
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RegistrationInfo {
    /// Empty when neither website column holds a URL
    pub website: String,
    pub explicit_deadline: Option<String>,
}

/// Keyword rules for the "Other Relevant?" column, first match wins
struct OtherRaceRule {
    keywords: &'static [&'static str],
    election_type: ElectionType,
    chamber: ChamberImpact,
    competitive: bool,
}

const OTHER_RACE_RULES: &[OtherRaceRule] = &[
    OtherRaceRule {
        keywords: &["mayoral", "mayor"],
        election_type: ElectionType::General,
        chamber: ChamberImpact::Local,
        competitive: true,
    },
    OtherRaceRule {
        keywords: &["city council"],
        election_type: ElectionType::General,
        chamber: ChamberImpact::Local,
        competitive: true,
    },
    OtherRaceRule {
        keywords: &["state senate", "state house", "state rep"],
        election_type: ElectionType::General,
        chamber: ChamberImpact::State,
        competitive: true,
    },
    OtherRaceRule {
        keywords: &["ballot measure"],
        election_type: ElectionType::Referendum,
        chamber: ChamberImpact::State,
        competitive: false,
    },
];

/// Chamber keywords for scraped section headings, first match wins
const SECTION_CHAMBER_RULES: &[(&[&str], ChamberImpact)] = &[
    (&["senate"], ChamberImpact::Senate),
    (&["house", "representative"], ChamberImpact::House),
    (
        &["governor", "attorney general", "secretary", "treasurer"],
        ChamberImpact::State,
    ),
];

/// Converts raw rows and scraped sections into normalized elections.
///
/// Pure: inputs are only read, and the same input always yields the same
/// elections in the same order.
#[derive(Debug, Clone, Copy)]
pub struct ElectionRecordBuilder<'a> {
    calendar: &'a ElectionCalendar,
    extractor: &'a CandidateExtractor,
}

impl<'a> ElectionRecordBuilder<'a> {
    pub fn new(calendar: &'a ElectionCalendar, extractor: &'a CandidateExtractor) -> Self {
        Self {
            calendar,
            extractor,
        }
    }

    /// Build every election an elections-sheet row describes, in column order:
    /// governor, House, referendums, then each "other" race.
    pub fn build_from_row(&self, row: &TabularRow) -> Vec<Election> {
        let mut elections = Vec::new();

        if self.governor_marked(row) {
            elections.push(Election {
                title: GOVERNOR_TITLE.to_string(),
                date: self.calendar.default_election_date(),
                election_type: ElectionType::General,
                candidates: Vec::new(),
                stakes: GOVERNOR_STAKES.to_string(),
                chamber_impact: ChamberImpact::State,
                competitive: true,
            });
        }

        if let Some(house) = cell(row, COL_HOUSE) {
            let (district, special_date) = self.split_special_date(house);
            if !district.is_empty() {
                let (election_type, date) = match special_date {
                    Some(date) => (ElectionType::Special, date),
                    None => (ElectionType::General, self.calendar.default_election_date()),
                };
                elections.push(Election {
                    title: format!("{}{}", HOUSE_TITLE_PREFIX, district),
                    date,
                    election_type,
                    candidates: Vec::new(),
                    stakes: district,
                    chamber_impact: ChamberImpact::House,
                    competitive: true,
                });
            }
        }

        if let Some(referendum) = cell(row, COL_REFERENDUMS) {
            let (title, special_date) = self.split_special_date(referendum);
            if !title.is_empty() {
                elections.push(Election {
                    title,
                    date: special_date.unwrap_or_else(|| self.calendar.default_election_date()),
                    election_type: ElectionType::Referendum,
                    candidates: Vec::new(),
                    stakes: REFERENDUM_STAKES.to_string(),
                    chamber_impact: ChamberImpact::State,
                    competitive: false,
                });
            }
        }

        if let Some(other) = cell(row, COL_OTHER) {
            elections.extend(self.build_other_races(other));
        }

        debug!(count = elections.len(), "Built elections from row");
        elections
    }

    /// Split an "Other Relevant?" cell on `,` / `;` into independent races
    fn build_other_races(&self, text: &str) -> Vec<Election> {
        text.split([',', ';'])
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .filter_map(|part| {
                let (title, special_date) = self.split_special_date(part);
                if title.is_empty() {
                    return None;
                }
                let rule = classify_other_race(&title);
                let (election_type, chamber_impact, competitive) = match rule {
                    Some(rule) => (rule.election_type, rule.chamber, rule.competitive),
                    None => (ElectionType::General, ChamberImpact::Local, true),
                };
                Some(Election {
                    stakes: title.clone(),
                    title,
                    date: special_date.unwrap_or_else(|| self.calendar.default_election_date()),
                    election_type,
                    candidates: Vec::new(),
                    chamber_impact,
                    competitive,
                })
            })
            .collect()
    }

    /// Build the election a scraped section describes.
    ///
    /// Sections without any recognizable candidate are not races and produce
    /// nothing.
    pub fn build_from_section(&self, section: &ScrapedSection, state_name: &str) -> Vec<Election> {
        let candidates: Vec<_> = self.extractor.extract(&section.text).collect();
        if candidates.is_empty() {
            return Vec::new();
        }

        let (title, special_date) = self.split_special_date(section.title.trim());
        if title.is_empty() {
            return Vec::new();
        }
        let (election_type, date) = match special_date {
            Some(date) => (ElectionType::Special, date),
            None => (ElectionType::General, self.calendar.default_election_date()),
        };

        vec![Election {
            chamber_impact: classify_section_chamber(&title),
            title,
            date,
            election_type,
            candidates,
            stakes: format!("Key race in {}", state_name),
            competitive: true,
        }]
    }

    /// Registration website and deadline from a logistics row.
    ///
    /// The online-registration column is preferred; the registration-check
    /// column is the fallback. Anything that is not a URL is dropped.
    pub fn registration_from_row(&self, row: &TabularRow) -> RegistrationInfo {
        let website = [COL_ONLINE_REGISTRATION, COL_CHECK_REGISTRATION]
            .iter()
            .filter_map(|col| row.get(*col).map(|v| v.trim()))
            .find(|v| v.starts_with("http"))
            .unwrap_or("")
            .to_string();

        let explicit_deadline = row
            .get(COL_REGISTRATION_DEADLINE)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        RegistrationInfo {
            website,
            explicit_deadline,
        }
    }

    fn governor_marked(&self, row: &TabularRow) -> bool {
        row.get(COL_GUBERNATORIAL)
            .is_some_and(|v| v.trim().eq_ignore_ascii_case(AFFIRMATIVE))
    }

    /// Strip special-date markers, returning the cleaned text and the marker's
    /// date when one was present
    fn split_special_date(&self, text: &str) -> (String, Option<String>) {
        let date = self.calendar.special_date_in(text).map(|s| s.date.clone());
        (self.calendar.strip_special_dates(text), date)
    }
}

/// Trimmed cell value, treating blank and "N/A" as absent
fn cell<'r>(row: &'r TabularRow, column: &str) -> Option<&'r str> {
    row.get(column)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case(NOT_APPLICABLE))
}

fn classify_other_race(title: &str) -> Option<&'static OtherRaceRule> {
    let lowered = title.to_lowercase();
    OTHER_RACE_RULES
        .iter()
        .find(|rule| rule.keywords.iter().any(|k| lowered.contains(k)))
}

fn classify_section_chamber(title: &str) -> ChamberImpact {
    let lowered = title.to_lowercase();
    SECTION_CHAMBER_RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lowered.contains(k)))
        .map(|(_, chamber)| *chamber)
        .unwrap_or(ChamberImpact::Local)
}
