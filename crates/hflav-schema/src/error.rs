//! Conversion error types.

use std::path::PathBuf;

use thiserror::Error;

use crate::validate::ValidationViolations;

/// Error while loading, validating or converting a data file.
#[derive(Error, Debug)]
pub enum ConversionError {
    /// A required argument was empty or missing. Raised before any file I/O.
    #[error("precondition violated: {0}")]
    Precondition(String),

    /// The document does not conform to the schema.
    #[error("data structure does not match the schema:\n{violations}")]
    Structure {
        /// Raw validator diagnostic text.
        details: String,
        /// Structured list of individual violations.
        violations: ValidationViolations,
    },

    /// The schema itself could not be compiled or parsed.
    #[error("invalid schema: {reason}")]
    InvalidSchema {
        /// Compiler or parser diagnostic.
        reason: String,
    },

    /// A file could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A file is not valid JSON.
    #[error("invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl ConversionError {
    /// Whether a schema resolution strategy may defer to the next one.
    ///
    /// Schema mismatches and unusable schemas are specific to the schema
    /// that was tried; unreadable or unparsable data files are not.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Structure { .. } | Self::InvalidSchema { .. })
    }

    /// The validator diagnostic text of a `Structure` error.
    pub fn details(&self) -> Option<&str> {
        match self {
            Self::Structure { details, .. } => Some(details),
            _ => None,
        }
    }
}
