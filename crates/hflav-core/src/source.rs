//! # Repository Capability Traits
//!
//! The two interfaces through which schema resolution reaches remote data.
//! Production implementations live in `hflav-client`; tests substitute
//! in-memory doubles.
//!
//! Both traits are synchronous and object-safe so that the resolution chain
//! can hold them behind `Arc<dyn ...>`.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::SourceError;
use crate::identity::RecordId;
use crate::model::{RecordDescriptor, TemplateDescriptor};
use crate::query::SearchQuery;

/// Access to published records and their files.
pub trait RecordRepository: Send + Sync {
    /// Search records. Zero hits is an empty vector, not an error.
    ///
    /// # Errors
    ///
    /// `SourceError::DataAccess` on transport or HTTP failure.
    fn search(&self, query: &SearchQuery) -> Result<Vec<RecordDescriptor>, SourceError>;

    /// Fetch one record by id.
    ///
    /// # Errors
    ///
    /// `SourceError::Precondition` for id `0`, `SourceError::DataAccess` on
    /// transport failure, `SourceError::DataNotFound` if the id is unknown.
    fn get_record(&self, id: RecordId) -> Result<RecordDescriptor, SourceError>;

    /// The template governing data created at `date` (latest when `None`).
    ///
    /// # Errors
    ///
    /// `SourceError::DataNotFound` if no template precedes `date`,
    /// `SourceError::DataAccess` on transport failure.
    fn resolve_template_for_date(
        &self,
        date: Option<DateTime<Utc>>,
    ) -> Result<TemplateDescriptor, SourceError>;

    /// Download a named file of a record and return the local path.
    ///
    /// `dest` may be a directory (the file keeps its published name) or a
    /// full file path. When absent the implementation picks its default
    /// download directory.
    ///
    /// # Errors
    ///
    /// `SourceError::Precondition` for id `0` or an empty filename,
    /// `SourceError::DataNotFound` if the file has no download location,
    /// `SourceError::DataAccess` on transport failure during the transfer.
    fn download(
        &self,
        record_id: RecordId,
        filename: &str,
        dest: Option<&Path>,
    ) -> Result<PathBuf, SourceError>;
}

/// Access to the out-of-band schema published in the companion repository.
pub trait SchemaRepository: Send + Sync {
    /// Retrieve the JSON Schema published at `version_tag`.
    ///
    /// # Errors
    ///
    /// `SourceError::SchemaNotFound` if the repository holds no schema file,
    /// `SourceError::VersionTagNotFound` if the tag does not exist,
    /// `SourceError::InvalidContent` if the file is not valid JSON.
    fn schema_for_version(&self, version_tag: &str) -> Result<Value, SourceError>;
}
