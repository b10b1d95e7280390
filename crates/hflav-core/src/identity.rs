//! # Record Identifiers
//!
//! Zenodo addresses every record version by a positive integer id (the
//! number shown in `https://zenodo.org/records/<id>`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SourceError;

/// Stable external identifier of a Zenodo record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl RecordId {
    /// Access the raw numeric id.
    pub fn get(self) -> u64 {
        self.0
    }

    /// Reject the zero id, which Zenodo never assigns.
    ///
    /// Repositories call this before any request so that a missing id
    /// surfaces as a precondition violation rather than a 404.
    pub fn require(self) -> Result<Self, SourceError> {
        if self.0 == 0 {
            return Err(SourceError::Precondition(
                "record id must be a positive integer".to_string(),
            ));
        }
        Ok(self)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for RecordId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl FromStr for RecordId {
    type Err = SourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|e| SourceError::Precondition(format!("invalid record id '{s}': {e}")))?
            .require()
    }
}
