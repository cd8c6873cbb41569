//! Persistence of the aggregate document.
//!
//! The document is read and written whole. There is no locking: a single
//! process owns the file for the duration of a run, and a crash mid-write
//! can leave it truncated, so callers keep their own backup.
//!
//! The stored document is handled as raw JSON. Entries written by hand or by
//! an older run may be malformed; the merge replaces the entries it has fresh
//! data for and the validator judges whatever is left.

use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};
use std::cell::RefCell;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::constants::TIMESTAMP_FORMAT;
use crate::domain::JurisdictionMap;
use crate::error::{AggregatorError, Result};
use crate::observability::metrics;

const LAST_UPDATED: &str = "lastUpdated";
const ELECTION_DATA: &str = "electionData";

/// Where the aggregate document lives
pub trait DocumentStore {
    /// The stored document, or `None` when nothing has been written yet
    fn read(&self) -> Result<Option<Value>>;

    fn write(&self, document: &Value) -> Result<()>;
}

/// Pretty-printed JSON file on local disk
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DocumentStore for JsonFileStore {
    fn read(&self) -> Result<Option<Value>> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let document = serde_json::from_str(&data)?;
        Ok(Some(document))
    }

    fn write(&self, document: &Value) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut json = serde_json::to_string_pretty(document)?;
        json.push('\n');
        fs::write(&self.path, &json)?;
        metrics::store::document_saved(json.len());
        debug!(path = %self.path.display(), bytes = json.len(), "Wrote document");
        Ok(())
    }
}

/// Keeps the document in memory; used by tests and dry runs
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    document: RefCell<Option<Value>>,
}

impl InMemoryDocumentStore {
    pub fn with_document(document: Value) -> Self {
        Self {
            document: RefCell::new(Some(document)),
        }
    }

    pub fn snapshot(&self) -> Option<Value> {
        self.document.borrow().clone()
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn read(&self) -> Result<Option<Value>> {
        Ok(self.document.borrow().clone())
    }

    fn write(&self, document: &Value) -> Result<()> {
        *self.document.borrow_mut() = Some(document.clone());
        Ok(())
    }
}

/// Jurisdiction, election and candidate totals of a raw document.
///
/// Entries without the expected shape count as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DocumentCounts {
    pub jurisdictions: usize,
    pub elections: usize,
    pub candidates: usize,
}

impl DocumentCounts {
    pub fn of(document: &Value) -> Self {
        let Some(data) = document.get(ELECTION_DATA).and_then(Value::as_object) else {
            return Self::default();
        };
        let elections: Vec<&Value> = data
            .values()
            .filter_map(|j| j.get("elections").and_then(Value::as_array))
            .flatten()
            .collect();
        let candidates = elections
            .iter()
            .filter_map(|e| e.get("candidates").and_then(Value::as_array))
            .map(Vec::len)
            .sum();
        Self {
            jurisdictions: data.len(),
            elections: elections.len(),
            candidates,
        }
    }
}

/// Owns the load, merge and save cycle of the aggregate document
pub struct DocumentManager<S> {
    store: S,
}

impl<S: DocumentStore> DocumentManager<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// The persisted document, or an empty one if none exists yet.
    ///
    /// Only the top level must be a JSON object; everything below it is
    /// left for the validator.
    pub fn load(&self) -> Result<Value> {
        let document = self.store.read()?;
        metrics::store::document_loaded(document.is_some());
        match document {
            Some(document @ Value::Object(_)) => {
                debug!(
                    jurisdictions = DocumentCounts::of(&document).jurisdictions,
                    "Loaded existing document"
                );
                Ok(document)
            }
            Some(other) => Err(AggregatorError::Document(format!(
                "expected a JSON object at the top level, found {}",
                json_kind(&other)
            ))),
            None => {
                info!("No existing document; starting from an empty one");
                Ok(empty_document())
            }
        }
    }

    /// Overlay `map` on `existing`, stamped with the current time
    pub fn apply_merge(&self, existing: Value, map: JurisdictionMap) -> Result<Value> {
        apply_merge_at(existing, map, Utc::now())
    }

    pub fn save(&self, document: &Value) -> Result<()> {
        self.store.write(document)?;
        let counts = DocumentCounts::of(document);
        info!(
            jurisdictions = counts.jurisdictions,
            elections = counts.elections,
            "Saved document"
        );
        Ok(())
    }
}

/// Every jurisdiction in `map` replaces the entry with the same code;
/// other entries and unrelated top-level fields are left as they were.
pub fn apply_merge_at(existing: Value, map: JurisdictionMap, at: DateTime<Utc>) -> Result<Value> {
    let mut root = match existing {
        Value::Object(root) => root,
        other => {
            return Err(AggregatorError::Document(format!(
                "expected a JSON object at the top level, found {}",
                json_kind(&other)
            )))
        }
    };

    let data = root
        .entry(ELECTION_DATA)
        .or_insert_with(|| Value::Object(Map::new()));
    if !data.is_object() {
        warn!(found = json_kind(data), "Replacing non-object electionData");
        *data = Value::Object(Map::new());
    }
    if let Value::Object(data) = data {
        for (code, jurisdiction) in map {
            data.insert(code, serde_json::to_value(jurisdiction)?);
        }
    }

    root.insert(
        LAST_UPDATED.to_string(),
        Value::String(at.format(TIMESTAMP_FORMAT).to_string()),
    );
    Ok(Value::Object(root))
}

fn empty_document() -> Value {
    json!({ "lastUpdated": "", "electionData": {} })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
