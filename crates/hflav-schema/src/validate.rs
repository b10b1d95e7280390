//! # Structural Validation
//!
//! Validates JSON documents against JSON Schema documents (draft detected
//! from `$schema`, draft-07 for synthesized schemas).
//!
//! ## Offline `$ref` resolution
//!
//! Validation never touches the network. A schema whose `$ref` points at
//! an external document cannot be checked completely, so it fails to
//! compile with `ConversionError::InvalidSchema` and the resolution chain
//! moves on. Only the JSON Schema meta-schema host is tolerated.

use std::fmt;

use jsonschema::{Retrieve, Uri, ValidationOptions, Validator};
use serde_json::Value;

use crate::error::ConversionError;

const META_SCHEMA_PREFIXES: [&str; 2] = ["http://json-schema.org/", "https://json-schema.org/"];

/// Retriever that refuses every external document except meta-schemas.
struct OfflineRetriever;

impl Retrieve for OfflineRetriever {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        if META_SCHEMA_PREFIXES
            .iter()
            .any(|prefix| uri.as_str().starts_with(prefix))
        {
            tracing::debug!(uri = uri.as_str(), "meta-schema reference left unchecked");
            return Ok(serde_json::json!({}));
        }
        tracing::warn!(uri = uri.as_str(), "external $ref cannot be resolved offline");
        Err(format!("external reference {} is not available offline", uri.as_str()).into())
    }
}

/// A single validation violation with structured context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// JSON Pointer path to the violating field in the instance.
    pub instance_path: String,
    /// JSON Pointer path within the schema that triggered the error.
    pub schema_path: String,
    /// Human-readable description of the violation.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_path.is_empty() {
            write!(f, "  (root): {}", self.message)
        } else {
            write!(f, "  {}: {}", self.instance_path, self.message)
        }
    }
}

/// Collection of validation violations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationViolations {
    violations: Vec<Violation>,
}

impl ValidationViolations {
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn into_inner(self) -> Vec<Violation> {
        self.violations
    }
}

impl From<Vec<Violation>> for ValidationViolations {
    fn from(violations: Vec<Violation>) -> Self {
        Self { violations }
    }
}

impl fmt::Display for ValidationViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

/// Validates documents against a schema supplied per call.
///
/// Holds no state between calls: every schema is compiled fresh, matching
/// the rule that resolved schemas are never cached across resolutions.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralValidator;

impl StructuralValidator {
    pub fn new() -> Self {
        Self
    }

    fn options() -> ValidationOptions {
        let mut opts = jsonschema::options();
        opts.with_retriever(OfflineRetriever);
        opts
    }

    /// Compile `schema` into a reusable validator.
    ///
    /// # Errors
    ///
    /// Returns `ConversionError::InvalidSchema` if `schema` is not a valid
    /// JSON Schema document.
    pub fn compile(&self, schema: &Value) -> Result<Validator, ConversionError> {
        Self::options()
            .build(schema)
            .map_err(|e| ConversionError::InvalidSchema {
                reason: e.to_string(),
            })
    }

    /// Validate `instance` against `schema`.
    ///
    /// # Errors
    ///
    /// Returns `ConversionError::Structure` carrying every violation when
    /// the instance does not conform, or `ConversionError::InvalidSchema`
    /// when the schema cannot be compiled.
    pub fn validate(&self, schema: &Value, instance: &Value) -> Result<(), ConversionError> {
        let validator = self.compile(schema)?;

        let errors: Vec<Violation> = validator
            .iter_errors(instance)
            .map(|e| Violation {
                instance_path: e.instance_path.to_string(),
                schema_path: e.schema_path.to_string(),
                message: e.to_string(),
            })
            .collect();

        if errors.is_empty() {
            return Ok(());
        }

        let violations = ValidationViolations::from(errors);
        tracing::debug!(count = violations.len(), "structural validation failed");
        Err(ConversionError::Structure {
            details: violations.to_string(),
            violations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_schema() -> Value {
        json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "type": "object",
            "properties": {
                "name": {"type": "string"},
                "value": {"type": "number"},
                "nested": {
                    "type": "object",
                    "properties": {"field": {"type": "string"}}
                }
            },
            "required": ["name", "value"]
        })
    }

    #[test]
    fn valid_document_passes() {
        let doc = json!({"name": "test", "value": 123, "nested": {"field": "v"}});
        StructuralValidator::new()
            .validate(&sample_schema(), &doc)
            .unwrap();
    }

    #[test]
    fn type_mismatch_is_reported_with_path() {
        let doc = json!({"name": "test", "value": "not_a_number"});
        let err = StructuralValidator::new()
            .validate(&sample_schema(), &doc)
            .unwrap_err();
        match &err {
            ConversionError::Structure {
                details,
                violations,
            } => {
                assert_eq!(violations.len(), 1);
                assert_eq!(violations.violations()[0].instance_path, "/value");
                assert!(details.contains("/value"));
            }
            other => panic!("Expected Structure, got: {other}"),
        }
    }

    #[test]
    fn missing_required_field_is_reported_at_root() {
        let doc = json!({"name": "test"});
        let err = StructuralValidator::new()
            .validate(&sample_schema(), &doc)
            .unwrap_err();
        let details = err.details().unwrap();
        assert!(details.contains("(root)"), "got: {details}");
        assert!(details.contains("value"), "got: {details}");
    }

    #[test]
    fn every_violation_is_collected() {
        let doc = json!({"name": 1, "value": "x"});
        let err = StructuralValidator::new()
            .validate(&sample_schema(), &doc)
            .unwrap_err();
        match err {
            ConversionError::Structure { violations, .. } => assert_eq!(violations.len(), 2),
            other => panic!("Expected Structure, got: {other}"),
        }
    }

    #[test]
    fn malformed_schema_is_invalid_schema() {
        let schema = json!({"type": "no-such-type"});
        let err = StructuralValidator::new()
            .validate(&schema, &json!({}))
            .unwrap_err();
        assert!(
            matches!(err, ConversionError::InvalidSchema { .. }),
            "Expected InvalidSchema, got: {err}"
        );
        assert!(err.is_recoverable());
    }

    #[test]
    fn external_refs_make_the_schema_unusable() {
        let schema = json!({
            "type": "object",
            "properties": {"remote": {"$ref": "https://unreachable.invalid/defs.json"}}
        });
        let err = StructuralValidator::new()
            .validate(&schema, &json!({"remote": [1, 2, 3]}))
            .unwrap_err();
        match &err {
            ConversionError::InvalidSchema { reason } => {
                assert!(reason.contains("unreachable.invalid"), "got: {reason}");
            }
            other => panic!("Expected InvalidSchema, got: {other}"),
        }
        assert!(err.is_recoverable());
    }

    #[test]
    fn local_refs_still_validate() {
        let schema = json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "definitions": {"avg": {"type": "number"}},
            "type": "object",
            "properties": {"value": {"$ref": "#/definitions/avg"}}
        });
        let validator = StructuralValidator::new();
        validator.validate(&schema, &json!({"value": 1.5})).unwrap();
        let err = validator.validate(&schema, &json!({"value": "x"})).unwrap_err();
        assert!(matches!(err, ConversionError::Structure { .. }));
    }

    #[test]
    fn violation_display_root() {
        let v = Violation {
            instance_path: String::new(),
            schema_path: "/additionalProperties".to_string(),
            message: "Additional properties are not allowed ('z' was unexpected)".to_string(),
        };
        assert!(v.to_string().contains("(root)"));
    }
}
