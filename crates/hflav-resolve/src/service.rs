//! Service layer: the operations a caller performs against HFLAV data,
//! composed from a record repository, the resolution chain and the model
//! builder.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use hflav_core::{
    RecordDescriptor, RecordId, RecordRepository, SchemaRepository, SearchQuery, SourceError,
    TemplateDescriptor,
};
use hflav_schema::{ConversionError, DynamicModelBuilder, DynamicRecord};
use serde_json::Value;

use crate::chain::SchemaResolutionChain;
use crate::error::ResolveError;

/// Entry point for searching and loading HFLAV data files.
pub struct HflavService {
    records: Arc<dyn RecordRepository>,
    chain: SchemaResolutionChain,
    builder: DynamicModelBuilder,
}

impl std::fmt::Debug for HflavService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HflavService")
            .field("chain", &self.chain)
            .finish_non_exhaustive()
    }
}

impl HflavService {
    /// Build a service whose chain shares `records` with the service.
    pub fn new(records: Arc<dyn RecordRepository>, schemas: Arc<dyn SchemaRepository>) -> Self {
        let chain = SchemaResolutionChain::new(Arc::clone(&records), schemas);
        Self::with_chain(records, chain)
    }

    /// Build a service around a preconfigured chain.
    pub fn with_chain(records: Arc<dyn RecordRepository>, chain: SchemaResolutionChain) -> Self {
        Self {
            records,
            chain,
            builder: DynamicModelBuilder::new(),
        }
    }

    /// Search records.
    ///
    /// Transport failures are logged and yield an empty list so that a
    /// browsing caller can carry on. Other failures are returned.
    pub fn search_records(
        &self,
        query: &SearchQuery,
    ) -> Result<Vec<RecordDescriptor>, SourceError> {
        match self.records.search(query) {
            Ok(records) => {
                tracing::info!(q = %query, count = records.len(), "found records");
                for (i, record) in records.iter().enumerate() {
                    tracing::debug!(index = i + 1, id = %record.id, title = %record.title, "record");
                }
                Ok(records)
            }
            Err(e @ SourceError::DataAccess { .. }) => {
                tracing::error!(q = %query, error = %e, "error while searching records");
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    /// Fetch a record, select the template in force at its creation date,
    /// download the named data file and resolve it through the chain.
    pub fn load_data_file(
        &self,
        record_id: RecordId,
        filename: &str,
        dest: Option<&Path>,
    ) -> Result<DynamicRecord, ResolveError> {
        tracing::info!(record_id = %record_id, "getting record");
        let record = self.records.get_record(record_id)?;
        tracing::info!(title = %record.title, created = %record.created_at, "record found");

        let template = self
            .records
            .resolve_template_for_date(Some(record.created_at))?;
        tracing::info!(
            template = %template.record_id(),
            title = template.title(),
            version = template.version(),
            "template found"
        );

        let data_path = self.records.download(record_id, filename, dest)?;
        tracing::info!(file = filename, path = %data_path.display(), "downloaded record file");

        self.chain.resolve(&template, &data_path)
    }

    /// Load a data file from local disk, validating against `schema_path`
    /// when given, or against a schema inferred from the file itself.
    pub fn load_local_data_file(
        &self,
        path: &Path,
        schema_path: Option<&Path>,
        validate: bool,
    ) -> Result<DynamicRecord, ResolveError> {
        Ok(self.builder.build_from_local(path, schema_path, validate)?)
    }

    /// The template in force at `date`, or the latest one.
    pub fn resolve_template(
        &self,
        date: Option<DateTime<Utc>>,
    ) -> Result<TemplateDescriptor, SourceError> {
        self.records.resolve_template_for_date(date)
    }

    /// Infer a draft-07 schema from the example document at `path`.
    pub fn infer_schema(&self, path: &Path) -> Result<Value, ConversionError> {
        self.builder.generate_schema(path)
    }
}
