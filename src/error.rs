use thiserror::Error;

use crate::sources::SourceError;

#[derive(Error, Debug)]
pub enum AggregatorError {
    #[error("JSON (de)serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed document: {0}")]
    Document(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Document failed validation with {count} violation(s); refusing to persist")]
    ValidationFailed { count: usize },
}

pub type Result<T> = std::result::Result<T, AggregatorError>;
