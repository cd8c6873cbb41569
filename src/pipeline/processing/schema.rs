use anyhow::{Context, Result};
use jsonschema::JSONSchema;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Schema shipped with the crate
pub const BUNDLED_SCHEMA: &str = include_str!("../../../schemas/elections.v1.json");

/// Compiled JSON Schema for the aggregate document.
///
/// Stricter than the structural validator: it also checks enum values,
/// code format and the timestamp pattern.
pub struct DocumentSchema {
    compiled: JSONSchema,
}

impl DocumentSchema {
    pub fn bundled() -> Result<Self> {
        let schema: Value =
            serde_json::from_str(BUNDLED_SCHEMA).context("Bundled schema is not valid JSON")?;
        Self::from_value(schema)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read schema {}", path.display()))?;
        let schema: Value = serde_json::from_str(&data)
            .with_context(|| format!("Failed to parse schema JSON in {}", path.display()))?;
        Self::from_value(schema)
    }

    pub fn from_value(schema: Value) -> Result<Self> {
        // jsonschema 0.17 expects a schema with 'static lifetime; leak it for the process lifetime
        let schema_static: &'static Value = Box::leak(Box::new(schema));
        let compiled = JSONSchema::options()
            .compile(schema_static)
            .context("Failed to compile JSON Schema")?;
        Ok(Self { compiled })
    }

    pub fn is_valid(&self, instance: &Value) -> bool {
        self.compiled.is_valid(instance)
    }

    /// Every schema error as "<message> at <instance path>"
    pub fn check(&self, instance: &Value) -> std::result::Result<(), Vec<String>> {
        self.compiled.validate(instance).map_err(|errors| {
            errors
                .map(|e| format!("{} at {}", e, e.instance_path))
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bundled_schema_compiles() {
        assert!(DocumentSchema::bundled().is_ok());
    }

    #[test]
    fn test_lowercase_code_is_rejected() {
        let schema = DocumentSchema::bundled().unwrap();
        let doc = json!({
            "lastUpdated": "2025-10-18T12:00:00Z",
            "electionData": {
                "va": {
                    "stateName": "Virginia",
                    "registrationWebsite": "",
                    "registrationDeadline": "October 05, 2025",
                    "elections": []
                }
            }
        });
        assert!(!schema.is_valid(&doc));
        assert!(!schema.check(&doc).unwrap_err().is_empty());
    }
}
