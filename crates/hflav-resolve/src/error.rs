//! Resolution error types.

use std::path::PathBuf;

use hflav_core::{RecordId, SourceError};
use hflav_schema::ConversionError;
use thiserror::Error;

use crate::chain::Attempt;

/// Error surfaced by schema resolution and the service layer.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// A repository call failed.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Loading, validating or converting a document failed.
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    /// The data file could not be read while looking for a version tag.
    #[error("cannot read data file {}: {source}", path.display())]
    DataFile {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A required argument was empty or missing.
    #[error("precondition violated: {0}")]
    Precondition(String),

    /// Every strategy declined or failed recoverably.
    #[error(
        "no schema resolution strategy available for template {record_id}{}",
        render_attempts(.attempts)
    )]
    Exhausted {
        record_id: RecordId,
        /// One entry per strategy visited, in chain order.
        attempts: Vec<Attempt>,
    },
}

impl ResolveError {
    /// Whether a non-terminal strategy may defer to the next one.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Source(e) => e.is_recoverable(),
            Self::Conversion(e) => e.is_recoverable(),
            Self::DataFile { .. } | Self::Precondition(_) | Self::Exhausted { .. } => false,
        }
    }
}

fn render_attempts(attempts: &[Attempt]) -> String {
    attempts.iter().map(|a| format!("\n  {a}")).collect()
}
