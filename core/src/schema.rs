//! JSON Schema validation seam.
//!
//! The check stream only needs a yes/no answer plus messages, so validation
//! sits behind [`SchemaValidator`]. [`JsonSchemaValidator`] is the default and
//! delegates to the `jsonschema` crate with draft auto-detection.

use serde_json::Value;

/// Outcome of validating one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaOutcome {
    pub valid: bool,
    pub errors: Vec<String>,
}

pub trait SchemaValidator: Send + Sync {
    /// Reject schemas that cannot be compiled.
    fn check_schema(&self, schema: &Value) -> Result<(), String>;

    /// Validate `value` against `schema`.
    fn validate(&self, schema: &Value, value: &Value) -> SchemaOutcome;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSchemaValidator;

impl SchemaValidator for JsonSchemaValidator {
    fn check_schema(&self, schema: &Value) -> Result<(), String> {
        jsonschema::validator_for(schema)
            .map(|_| ())
            .map_err(|err| err.to_string())
    }

    fn validate(&self, schema: &Value, value: &Value) -> SchemaOutcome {
        let validator = match jsonschema::validator_for(schema) {
            Ok(validator) => validator,
            Err(err) => {
                return SchemaOutcome {
                    valid: false,
                    errors: vec![format!("invalid schema: {err}")],
                }
            }
        };
        let errors: Vec<String> = validator
            .iter_errors(value)
            .map(|err| err.to_string())
            .collect();
        SchemaOutcome {
            valid: errors.is_empty(),
            errors,
        }
    }
}
