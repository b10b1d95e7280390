//! # Source Error Taxonomy
//!
//! Errors raised by anything that reaches a remote source (Zenodo records,
//! the companion GitLab repository) or stages its files on disk.
//!
//! ## Design
//!
//! - Transport failures are always reported to the immediate caller.
//! - Not-found outcomes are kept distinct from transport failures: a missing
//!   schema or tag is a legitimate terminal outcome for one resolution
//!   strategy, not a malfunction.
//! - Precondition violations are never retried and never treated as a signal
//!   to try another strategy.

use thiserror::Error;

/// Error raised by record and schema repositories.
#[derive(Error, Debug)]
pub enum SourceError {
    /// Network or HTTP-layer failure reaching a remote source.
    #[error("{message}")]
    DataAccess {
        /// Short description of the failed operation.
        message: String,
        /// Underlying transport diagnostic, if any.
        details: Option<String>,
    },

    /// The requested entity does not exist at the source.
    #[error("{message}")]
    DataNotFound {
        /// Short description of what was missing.
        message: String,
        /// Additional context, if any.
        details: Option<String>,
    },

    /// No schema file was found anywhere in the companion repository.
    #[error("no schema found inside the GitLab repository")]
    SchemaNotFound {
        /// Underlying diagnostic, if any.
        details: Option<String>,
    },

    /// The version tag requested does not exist in the companion repository.
    #[error("tag '{tag}' not found in the GitLab repository")]
    VersionTagNotFound {
        /// The tag that was looked up.
        tag: String,
        /// Underlying diagnostic, if any.
        details: Option<String>,
    },

    /// A remote document was retrieved but its content is unusable.
    #[error("invalid content in {source_name}: {reason}")]
    InvalidContent {
        /// Name or path of the offending document.
        source_name: String,
        /// Parse diagnostic.
        reason: String,
    },

    /// The caller supplied an empty or missing required argument.
    #[error("precondition violated: {0}")]
    Precondition(String),

    /// Local filesystem failure while staging a download.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl SourceError {
    /// Build a `DataAccess` error from a transport diagnostic.
    pub fn access(message: impl Into<String>, details: impl ToString) -> Self {
        Self::DataAccess {
            message: message.into(),
            details: Some(details.to_string()),
        }
    }

    /// Build a `DataNotFound` error without further details.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::DataNotFound {
            message: message.into(),
            details: None,
        }
    }

    /// Whether this failure is a legitimate "nothing here" outcome that a
    /// schema resolution strategy may treat as a reason to defer.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::DataNotFound { .. }
                | Self::SchemaNotFound { .. }
                | Self::VersionTagNotFound { .. }
                | Self::InvalidContent { .. }
        )
    }

    /// The underlying diagnostic attached to the error, if any.
    pub fn details(&self) -> Option<&str> {
        match self {
            Self::DataAccess { details, .. }
            | Self::DataNotFound { details, .. }
            | Self::SchemaNotFound { details }
            | Self::VersionTagNotFound { details, .. } => details.as_deref(),
            Self::InvalidContent { reason, .. } => Some(reason),
            Self::Precondition(_) | Self::Io(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_kinds_are_recoverable() {
        assert!(SourceError::not_found("gone").is_recoverable());
        assert!(SourceError::SchemaNotFound { details: None }.is_recoverable());
        assert!(SourceError::VersionTagNotFound {
            tag: "v1".into(),
            details: None
        }
        .is_recoverable());
        assert!(SourceError::InvalidContent {
            source_name: "x.schema".into(),
            reason: "eof".into()
        }
        .is_recoverable());
    }

    #[test]
    fn access_and_precondition_are_fatal() {
        assert!(!SourceError::access("GET /records", "connection refused").is_recoverable());
        assert!(!SourceError::Precondition("empty filename".into()).is_recoverable());
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert!(!SourceError::from(io).is_recoverable());
    }

    #[test]
    fn details_are_exposed() {
        let err = SourceError::access("GET /records", "timed out");
        assert_eq!(err.details(), Some("timed out"));
        assert_eq!(err.to_string(), "GET /records");

        let tag = SourceError::VersionTagNotFound {
            tag: "v9".into(),
            details: None,
        };
        assert!(tag.to_string().contains("'v9'"));
        assert_eq!(tag.details(), None);
    }
}
