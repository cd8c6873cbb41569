use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Per-jurisdiction election data keyed by two-letter code.
///
/// A `BTreeMap` keeps serialized output ordered by code so repeated runs
/// produce byte-identical documents.
pub type JurisdictionMap = BTreeMap<String, Jurisdiction>;

/// One state (or the federal district) as it appears in the aggregate document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Jurisdiction {
    pub state_name: String,
    pub registration_website: String,
    pub registration_deadline: String,
    pub elections: Vec<Election>,
}

impl Jurisdiction {
    /// An entry with no registration data and no elections
    pub fn empty(state_name: impl Into<String>) -> Self {
        Self {
            state_name: state_name.into(),
            registration_website: String::new(),
            registration_deadline: String::new(),
            elections: Vec::new(),
        }
    }

    /// Whether an election with exactly this title is already listed
    pub fn has_election_titled(&self, title: &str) -> bool {
        self.elections.iter().any(|e| e.title == title)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Election {
    /// Dedup key within a jurisdiction (exact match)
    pub title: String,
    pub date: String,
    #[serde(rename = "type")]
    pub election_type: ElectionType,
    pub candidates: Vec<Candidate>,
    pub stakes: String,
    pub chamber_impact: ChamberImpact,
    pub competitive: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElectionType {
    #[serde(rename = "General Election")]
    General,
    #[serde(rename = "Special Election")]
    Special,
    #[serde(rename = "Referendum")]
    Referendum,
}

impl ElectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElectionType::General => "General Election",
            ElectionType::Special => "Special Election",
            ElectionType::Referendum => "Referendum",
        }
    }
}

impl fmt::Display for ElectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Level of government an election affects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChamberImpact {
    Senate,
    House,
    State,
    Local,
}

impl ChamberImpact {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChamberImpact::Senate => "Senate",
            ChamberImpact::House => "House",
            ChamberImpact::State => "State",
            ChamberImpact::Local => "Local",
        }
    }
}

impl fmt::Display for ChamberImpact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub name: String,
    pub party: Party,
    pub incumbent: bool,
}

/// Party affiliation. Unrecognized codes are carried verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Party {
    Republican,
    Democratic,
    Independent,
    Green,
    Other(String),
}

impl Party {
    pub fn as_str(&self) -> &str {
        match self {
            Party::Republican => "Republican",
            Party::Democratic => "Democratic",
            Party::Independent => "Independent",
            Party::Green => "Green",
            Party::Other(raw) => raw,
        }
    }
}

impl From<String> for Party {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Republican" => Party::Republican,
            "Democratic" => Party::Democratic,
            "Independent" => Party::Independent,
            "Green" => Party::Green,
            _ => Party::Other(value),
        }
    }
}

impl From<Party> for String {
    fn from(party: Party) -> Self {
        match party {
            Party::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed view of the persisted document consumed by the map front end.
///
/// The store itself keeps the document as raw JSON so that a malformed entry
/// can be replaced by a merge; this type is for readers of a valid document.
/// Top-level keys other than `lastUpdated` and `electionData` (for example
/// `contactEmail`) are kept in `extra` and written back untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateDocument {
    #[serde(default)]
    pub last_updated: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub election_data: JurisdictionMap,
}

impl AggregateDocument {
    pub fn election_count(&self) -> usize {
        self.election_data.values().map(|j| j.elections.len()).sum()
    }

    pub fn candidate_count(&self) -> usize {
        self.election_data
            .values()
            .flat_map(|j| j.elections.iter())
            .map(|e| e.candidates.len())
            .sum()
    }
}
