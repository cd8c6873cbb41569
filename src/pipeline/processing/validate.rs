use serde_json::{Map, Value};
use std::fmt;
use tracing::{debug, warn};

use crate::domain::AggregateDocument;
use crate::observability::metrics;
use crate::registry::JurisdictionRegistry;

/// JSON shape a required attribute must have
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    String,
    Bool,
    Array,
    Object,
}

impl Shape {
    fn matches(&self, value: &Value) -> bool {
        match self {
            Shape::String => value.is_string(),
            Shape::Bool => value.is_boolean(),
            Shape::Array => value.is_array(),
            Shape::Object => value.is_object(),
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Shape::String => "string",
            Shape::Bool => "boolean",
            Shape::Array => "array",
            Shape::Object => "object",
        }
    }
}

const DOCUMENT_FIELDS: &[(&str, Shape)] = &[("lastUpdated", Shape::String), ("electionData", Shape::Object)];

const JURISDICTION_FIELDS: &[(&str, Shape)] = &[
    ("stateName", Shape::String),
    ("registrationWebsite", Shape::String),
    ("registrationDeadline", Shape::String),
    ("elections", Shape::Array),
];

const ELECTION_FIELDS: &[(&str, Shape)] = &[
    ("title", Shape::String),
    ("date", Shape::String),
    ("type", Shape::String),
    ("candidates", Shape::Array),
    ("stakes", Shape::String),
    ("chamberImpact", Shape::String),
    ("competitive", Shape::Bool),
];

const CANDIDATE_FIELDS: &[(&str, Shape)] = &[
    ("name", Shape::String),
    ("party", Shape::String),
    ("incumbent", Shape::Bool),
];

/// Where in the document a violation was found
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViolationPath {
    pub jurisdiction: Option<String>,
    /// Index and title (when readable) of the election
    pub election: Option<(usize, Option<String>)>,
    /// Index and name (when readable) of the candidate
    pub candidate: Option<(usize, Option<String>)>,
}

impl fmt::Display for ViolationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("document")?;
        if let Some(code) = &self.jurisdiction {
            write!(f, " > {}", code)?;
        }
        if let Some((index, title)) = &self.election {
            write!(f, " > elections[{}]", index)?;
            if let Some(title) = title {
                write!(f, " \"{}\"", title)?;
            }
        }
        if let Some((index, name)) = &self.candidate {
            write!(f, " > candidates[{}]", index)?;
            if let Some(name) = name {
                write!(f, " \"{}\"", name)?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationKind {
    Missing,
    WrongShape { expected: &'static str },
    /// A registry jurisdiction has no entry at all
    MissingJurisdiction,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub path: ViolationPath,
    pub attribute: String,
    pub kind: ViolationKind,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ViolationKind::Missing => write!(f, "{}: missing `{}`", self.path, self.attribute),
            ViolationKind::WrongShape { expected } => {
                write!(f, "{}: `{}` is not a {}", self.path, self.attribute, expected)
            }
            ViolationKind::MissingJurisdiction => {
                write!(f, "{}: no entry for jurisdiction `{}`", self.path, self.attribute)
            }
        }
    }
}

/// Structural validation of the aggregate document.
///
/// Confirms each required attribute is present with the right JSON shape;
/// values themselves are not judged. Never modifies its input.
#[derive(Debug, Clone, Copy, Default)]
pub struct Validator<'a> {
    registry: Option<&'a JurisdictionRegistry>,
}

impl<'a> Validator<'a> {
    pub fn new() -> Self {
        Self { registry: None }
    }

    /// Also require one entry per registry jurisdiction
    pub fn with_registry(registry: &'a JurisdictionRegistry) -> Self {
        Self {
            registry: Some(registry),
        }
    }

    pub fn validate(&self, document: &Value) -> Result<(), Vec<Violation>> {
        let mut violations = Vec::new();
        self.walk_document(document, &mut violations);

        metrics::validate::documents_checked();
        if violations.is_empty() {
            debug!("Document passed validation");
            Ok(())
        } else {
            metrics::validate::violations_found(violations.len());
            warn!(count = violations.len(), "Document failed validation");
            Err(violations)
        }
    }

    /// Validate a typed document through its serialized form
    pub fn validate_document(&self, document: &AggregateDocument) -> Result<(), Vec<Violation>> {
        match serde_json::to_value(document) {
            Ok(value) => self.validate(&value),
            Err(e) => Err(vec![Violation {
                path: ViolationPath::default(),
                attribute: format!("<unserializable: {}>", e),
                kind: ViolationKind::WrongShape { expected: "object" },
            }]),
        }
    }

    fn walk_document(&self, document: &Value, out: &mut Vec<Violation>) {
        let root = ViolationPath::default();
        let Some(object) = as_object(document, &root, "<document>", out) else {
            return;
        };
        check_fields(object, DOCUMENT_FIELDS, &root, out);

        let Some(data) = object.get("electionData").and_then(Value::as_object) else {
            return;
        };

        if let Some(registry) = self.registry {
            for code in registry.codes() {
                if !data.contains_key(code) {
                    out.push(Violation {
                        path: root.clone(),
                        attribute: code.to_string(),
                        kind: ViolationKind::MissingJurisdiction,
                    });
                }
            }
        }

        for (code, jurisdiction) in data {
            let path = ViolationPath {
                jurisdiction: Some(code.clone()),
                ..ViolationPath::default()
            };
            walk_jurisdiction(jurisdiction, path, out);
        }
    }
}

fn walk_jurisdiction(value: &Value, path: ViolationPath, out: &mut Vec<Violation>) {
    let Some(object) = as_object(value, &path, "<jurisdiction>", out) else {
        return;
    };
    check_fields(object, JURISDICTION_FIELDS, &path, out);

    let Some(elections) = object.get("elections").and_then(Value::as_array) else {
        return;
    };
    for (index, election) in elections.iter().enumerate() {
        let title = label(election, "title");
        let path = ViolationPath {
            election: Some((index, title)),
            ..path.clone()
        };
        walk_election(election, path, out);
    }
}

fn walk_election(value: &Value, path: ViolationPath, out: &mut Vec<Violation>) {
    let Some(object) = as_object(value, &path, "<election>", out) else {
        return;
    };
    check_fields(object, ELECTION_FIELDS, &path, out);

    let Some(candidates) = object.get("candidates").and_then(Value::as_array) else {
        return;
    };
    for (index, candidate) in candidates.iter().enumerate() {
        let path = ViolationPath {
            candidate: Some((index, label(candidate, "name"))),
            ..path.clone()
        };
        if let Some(object) = as_object(candidate, &path, "<candidate>", out) {
            check_fields(object, CANDIDATE_FIELDS, &path, out);
        }
    }
}

fn as_object<'v>(
    value: &'v Value,
    path: &ViolationPath,
    what: &str,
    out: &mut Vec<Violation>,
) -> Option<&'v Map<String, Value>> {
    let object = value.as_object();
    if object.is_none() {
        out.push(Violation {
            path: path.clone(),
            attribute: what.to_string(),
            kind: ViolationKind::WrongShape {
                expected: Shape::Object.as_str(),
            },
        });
    }
    object
}

fn check_fields(
    object: &Map<String, Value>,
    fields: &[(&str, Shape)],
    path: &ViolationPath,
    out: &mut Vec<Violation>,
) {
    for (name, shape) in fields {
        let kind = match object.get(*name) {
            None => ViolationKind::Missing,
            Some(value) if !shape.matches(value) => ViolationKind::WrongShape {
                expected: shape.as_str(),
            },
            Some(_) => continue,
        };
        out.push(Violation {
            path: path.clone(),
            attribute: name.to_string(),
            kind,
        });
    }
}

fn label(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}
