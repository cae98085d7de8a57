//! Schema validation for rule documents.

use std::collections::HashMap;
use std::fmt;

use jsonschema::{Draft, JSONSchema};
use serde_json::Value;
use thiserror::Error;

/// Name of the built-in schema for Prometheus rule files.
pub const RULES_SCHEMA: &str = "rules.json";

const RULES_SCHEMA_SOURCE: &str = include_str!("schemas/rules.json");

/// Validation problems found in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: Vec<String>,
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.errors.join("; "))
    }
}

/// Checks a document against a named schema.
pub trait Validator: Send + Sync {
    fn validate(&self, schema: &str, document: &Value) -> Result<(), ValidationReport>;
}

#[derive(Debug, Error)]
#[error("invalid schema '{name}': {message}")]
pub struct SchemaError {
    pub name: String,
    pub message: String,
}

/// JSON Schema backed validator holding compiled schemas by name.
pub struct JsonSchemaValidator {
    schemas: HashMap<String, JSONSchema>,
}

impl JsonSchemaValidator {
    /// A validator preloaded with the rule file schema.
    pub fn new() -> Result<Self, SchemaError> {
        let source: Value = serde_json::from_str(RULES_SCHEMA_SOURCE).map_err(|e| SchemaError {
            name: RULES_SCHEMA.to_string(),
            message: e.to_string(),
        })?;
        let mut validator = Self {
            schemas: HashMap::new(),
        };
        validator.register(RULES_SCHEMA, &source)?;
        Ok(validator)
    }

    /// Compile and register `schema` under `name`, replacing any previous one.
    pub fn register(&mut self, name: &str, schema: &Value) -> Result<(), SchemaError> {
        let compiled = JSONSchema::options()
            .with_draft(Draft::Draft7)
            .compile(schema)
            .map_err(|e| SchemaError {
                name: name.to_string(),
                message: e.to_string(),
            })?;
        self.schemas.insert(name.to_string(), compiled);
        Ok(())
    }
}

impl Validator for JsonSchemaValidator {
    fn validate(&self, schema: &str, document: &Value) -> Result<(), ValidationReport> {
        let Some(compiled) = self.schemas.get(schema) else {
            return Err(ValidationReport {
                errors: vec![format!("schema '{schema}' is not registered")],
            });
        };

        compiled.validate(document).map_err(|errors| ValidationReport {
            errors: errors
                .map(|e| {
                    let path = e.instance_path.to_string();
                    if path.is_empty() {
                        e.to_string()
                    } else {
                        format!("{path}: {e}")
                    }
                })
                .collect(),
        })
    }
}
