//! # Dynamic Model Builder
//!
//! Loads a JSON data file, optionally validates it against a schema, and
//! converts it into a [`DynamicRecord`].
//!
//! Validation modes of [`DynamicModelBuilder::build_from_path`]:
//!
//! | `schema` | `validate` | behaviour                                        |
//! |----------|------------|--------------------------------------------------|
//! | `Some`   | `true`     | validate against the given schema, then convert  |
//! | `None`   | `true`     | infer a schema from the document, validate       |
//! | any      | `false`    | convert the raw document, no schema involved     |

use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::error::ConversionError;
use crate::infer::infer_document_schema;
use crate::record::DynamicRecord;
use crate::validate::StructuralValidator;

/// Converts JSON data files into [`DynamicRecord`]s.
#[derive(Debug, Clone, Default)]
pub struct DynamicModelBuilder {
    validator: StructuralValidator,
}

impl DynamicModelBuilder {
    pub fn new() -> Self {
        Self {
            validator: StructuralValidator::new(),
        }
    }

    /// Read and parse a JSON file.
    ///
    /// # Errors
    ///
    /// `ConversionError::Io` if the file cannot be read and
    /// `ConversionError::Json` if it is not valid JSON.
    pub fn load_document(&self, path: &Path) -> Result<Value, ConversionError> {
        let text = fs::read_to_string(path).map_err(|source| ConversionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConversionError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Infer a draft-07 schema from the example document at `path`.
    pub fn generate_schema(&self, path: &Path) -> Result<Value, ConversionError> {
        require_path(path, "example path")?;
        let example = self.load_document(path)?;
        let schema = infer_document_schema(&example);
        tracing::debug!(path = %path.display(), "inferred schema from example");
        Ok(schema)
    }

    /// Read a schema file. Content that is not JSON is an unusable schema,
    /// reported as `ConversionError::InvalidSchema`.
    pub fn read_schema(&self, path: &Path) -> Result<Value, ConversionError> {
        require_path(path, "schema path")?;
        let text = fs::read_to_string(path).map_err(|source| ConversionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|e| ConversionError::InvalidSchema {
            reason: format!("{}: {e}", path.display()),
        })
    }

    /// Validate the data file at `data_path` against `schema` and convert it.
    ///
    /// # Errors
    ///
    /// `ConversionError::Precondition` when `schema` is null or `{}` or
    /// `data_path` is empty. Checked before the data file is opened.
    pub fn convert_with_schema(
        &self,
        schema: &Value,
        data_path: &Path,
    ) -> Result<DynamicRecord, ConversionError> {
        if is_empty_schema(schema) {
            return Err(ConversionError::Precondition(
                "a non-empty schema must be provided".to_string(),
            ));
        }
        require_path(data_path, "data path")?;

        tracing::debug!(schema = %schema, "validating against schema");
        let document = self.load_document(data_path)?;
        self.validator.validate(schema, &document)?;

        let record = DynamicRecord::from(document);
        tracing::debug!(
            path = %data_path.display(),
            fields = record.len(),
            "data loaded"
        );
        Ok(record)
    }

    /// Load `data_path` into a record. See the module table for how
    /// `schema` and `validate` interact.
    pub fn build_from_path(
        &self,
        data_path: &Path,
        schema: Option<&Value>,
        validate: bool,
    ) -> Result<DynamicRecord, ConversionError> {
        require_path(data_path, "data path")?;

        if !validate {
            return Ok(DynamicRecord::from(self.load_document(data_path)?));
        }

        match schema {
            Some(schema) => self.convert_with_schema(schema, data_path),
            None => {
                let schema = self.generate_schema(data_path)?;
                self.convert_with_schema(&schema, data_path)
            }
        }
    }

    /// Load a local data file, validating against the schema file at
    /// `schema_path` when one is given.
    pub fn build_from_local(
        &self,
        data_path: &Path,
        schema_path: Option<&Path>,
        validate: bool,
    ) -> Result<DynamicRecord, ConversionError> {
        require_path(data_path, "data path")?;
        match schema_path {
            Some(schema_path) if validate => {
                let schema = self.read_schema(schema_path)?;
                self.convert_with_schema(&schema, data_path)
            }
            _ => self.build_from_path(data_path, None, validate),
        }
    }
}

fn is_empty_schema(schema: &Value) -> bool {
    match schema {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

fn require_path(path: &Path, what: &str) -> Result<(), ConversionError> {
    if path.as_os_str().is_empty() {
        return Err(ConversionError::Precondition(format!("{what} must be provided")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_schema_is_a_precondition_error() {
        let builder = DynamicModelBuilder::new();
        let missing = Path::new("/definitely/not/here.json");
        for schema in [Value::Null, json!({})] {
            let err = builder.convert_with_schema(&schema, missing).unwrap_err();
            assert!(
                matches!(err, ConversionError::Precondition(_)),
                "Expected Precondition, got: {err}"
            );
        }
    }

    #[test]
    fn empty_data_path_is_a_precondition_error() {
        let builder = DynamicModelBuilder::new();
        let err = builder
            .convert_with_schema(&json!({"type": "object"}), Path::new(""))
            .unwrap_err();
        assert!(matches!(err, ConversionError::Precondition(_)));

        let err = builder.build_from_path(Path::new(""), None, false).unwrap_err();
        assert!(matches!(err, ConversionError::Precondition(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = DynamicModelBuilder::new()
            .load_document(Path::new("/definitely/not/here.json"))
            .unwrap_err();
        assert!(matches!(err, ConversionError::Io { .. }));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn empty_schema_detection() {
        assert!(is_empty_schema(&Value::Null));
        assert!(is_empty_schema(&json!({})));
        assert!(!is_empty_schema(&json!({"type": "object"})));
        assert!(!is_empty_schema(&json!(true)));
    }
}
