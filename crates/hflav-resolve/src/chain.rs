//! # Schema Resolution Chain
//!
//! Turns a `(template, data file)` pair into a validated [`DynamicRecord`] by
//! trying three strategies in a fixed order:
//!
//! ```text
//! EmbeddedSchema ──▶ GitLabSchema ──▶ TemplateInference ──▶ Exhausted
//! ```
//!
//! At each step the strategy first checks the template's capability markers
//! (no I/O). A strategy that cannot handle the template is skipped. One that
//! can handle it either returns the record, fails recoverably (the chain
//! moves on), or fails fatally (the error is returned as is).
//!
//! | Strategy | Requires | Recoverable failures |
//! |----------|----------|----------------------|
//! | `EmbeddedSchema` | `embedded_schema_file` | schema file missing, unparsable or unusable schema, data mismatch |
//! | `GitLabSchema` | `template_file` | no schema in repository, unknown tag, unparsable schema, data mismatch |
//! | `TemplateInference` | `template_file` | none: terminal |
//!
//! Precondition violations, transport failures and unreadable data files
//! always abort the chain. Strategies never run speculatively or out of
//! order, and no schema is cached between calls.

use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use hflav_core::{FileReference, RecordRepository, SchemaRepository, TemplateDescriptor};
use hflav_schema::{ConversionError, DynamicModelBuilder, DynamicRecord};
use serde_json::Value;

use crate::error::ResolveError;

/// Version tag used when a data file does not name one.
pub const DEFAULT_VERSION_TAG: &str = "main";

/// One link of the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Validate against the JSON Schema published in the template record.
    EmbeddedSchema,
    /// Validate against the schema in the companion GitLab repository at
    /// the version tag named by the data file.
    GitLabSchema,
    /// Validate against a schema inferred from the template's example file.
    TemplateInference,
}

impl Strategy {
    /// Priority order in which strategies are visited.
    pub const ORDER: [Strategy; 3] = [
        Strategy::EmbeddedSchema,
        Strategy::GitLabSchema,
        Strategy::TemplateInference,
    ];

    /// The capability marker this strategy depends on, if present.
    pub fn marker(self, template: &TemplateDescriptor) -> Option<&FileReference> {
        match self {
            Self::EmbeddedSchema => template.embedded_schema_file(),
            Self::GitLabSchema | Self::TemplateInference => template.template_file(),
        }
    }

    /// Pure predicate over the template's capability markers.
    pub fn can_handle(self, template: &TemplateDescriptor) -> bool {
        self.marker(template).is_some()
    }

    /// Failures of a terminal strategy are never deferred.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::TemplateInference)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::EmbeddedSchema => "embedded-schema",
            Self::GitLabSchema => "gitlab-schema",
            Self::TemplateInference => "template-inference",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why one strategy did not produce a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub strategy: Strategy,
    pub reason: String,
}

impl Attempt {
    fn declined(strategy: Strategy) -> Self {
        let marker = match strategy {
            Strategy::EmbeddedSchema => "embedded schema file",
            Strategy::GitLabSchema | Strategy::TemplateInference => "template file",
        };
        Self {
            strategy,
            reason: format!("declined: template has no {marker}"),
        }
    }
}

impl fmt::Display for Attempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.strategy, self.reason)
    }
}

/// Ordered schema resolution over injected repositories.
pub struct SchemaResolutionChain {
    records: Arc<dyn RecordRepository>,
    schemas: Arc<dyn SchemaRepository>,
    builder: DynamicModelBuilder,
    download_dir: Option<PathBuf>,
    default_tag: String,
}

impl fmt::Debug for SchemaResolutionChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaResolutionChain")
            .field("download_dir", &self.download_dir)
            .field("default_tag", &self.default_tag)
            .finish_non_exhaustive()
    }
}

impl SchemaResolutionChain {
    pub fn new(records: Arc<dyn RecordRepository>, schemas: Arc<dyn SchemaRepository>) -> Self {
        Self {
            records,
            schemas,
            builder: DynamicModelBuilder::new(),
            download_dir: None,
            default_tag: DEFAULT_VERSION_TAG.to_string(),
        }
    }

    /// Where schema and template files are downloaded. Without one the
    /// record repository picks its own default.
    pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = Some(dir.into());
        self
    }

    /// Tag used by `GitLabSchema` when the data file names none.
    pub fn with_default_tag(mut self, tag: impl Into<String>) -> Self {
        self.default_tag = tag.into();
        self
    }

    /// Resolve a schema for `data_path` under `template` and convert the
    /// data file into a record.
    ///
    /// # Errors
    ///
    /// - `ResolveError::Precondition` if `data_path` is empty (no I/O done).
    /// - `ResolveError::Exhausted` if no strategy could handle the template
    ///   or every capable one failed recoverably.
    /// - Any non-recoverable error from the strategy that raised it.
    pub fn resolve(
        &self,
        template: &TemplateDescriptor,
        data_path: &Path,
    ) -> Result<DynamicRecord, ResolveError> {
        if data_path.as_os_str().is_empty() {
            return Err(ResolveError::Precondition(
                "a data path must be provided".to_string(),
            ));
        }

        let mut attempts = Vec::with_capacity(Strategy::ORDER.len());
        for strategy in Strategy::ORDER {
            let Some(file) = strategy.marker(template) else {
                tracing::debug!(strategy = %strategy, "cannot handle template, passing on");
                attempts.push(Attempt::declined(strategy));
                continue;
            };

            tracing::info!(
                strategy = %strategy,
                template = %template.record_id(),
                data = %data_path.display(),
                "handling schema resolution"
            );
            match self.run(strategy, template, file, data_path) {
                Ok(record) => {
                    tracing::info!(strategy = %strategy, "data loaded");
                    return Ok(record);
                }
                Err(e) if !strategy.is_terminal() && e.is_recoverable() => {
                    tracing::warn!(strategy = %strategy, error = %e, "strategy failed, passing on");
                    attempts.push(Attempt {
                        strategy,
                        reason: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        Err(ResolveError::Exhausted {
            record_id: template.record_id(),
            attempts,
        })
    }

    fn run(
        &self,
        strategy: Strategy,
        template: &TemplateDescriptor,
        file: &FileReference,
        data_path: &Path,
    ) -> Result<DynamicRecord, ResolveError> {
        let schema = match strategy {
            Strategy::EmbeddedSchema => {
                let schema_path = self.download(template, file)?;
                self.builder.read_schema(&schema_path)?
            }
            Strategy::GitLabSchema => {
                let tag = scan_version_tag(data_path, &self.default_tag).map_err(|source| {
                    ResolveError::DataFile {
                        path: data_path.to_path_buf(),
                        source,
                    }
                })?;
                tracing::debug!(tag = %tag, "schema version tag");
                self.schemas.schema_for_version(&tag)?
            }
            Strategy::TemplateInference => {
                let example_path = self.download(template, file)?;
                self.builder.generate_schema(&example_path)?
            }
        };
        if is_empty_schema(&schema) {
            return Err(ConversionError::InvalidSchema {
                reason: format!("{strategy} produced an empty schema"),
            }
            .into());
        }
        Ok(self.builder.convert_with_schema(&schema, data_path)?)
    }

    fn download(
        &self,
        template: &TemplateDescriptor,
        file: &FileReference,
    ) -> Result<PathBuf, ResolveError> {
        tracing::info!(file = file.name(), "downloading");
        let path = self.records.download(
            template.record_id(),
            file.name(),
            self.download_dir.as_deref(),
        )?;
        tracing::debug!(path = %path.display(), "downloaded");
        Ok(path)
    }
}

/// A fetched schema of `null` or `{}` constrains nothing.
fn is_empty_schema(schema: &Value) -> bool {
    match schema {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Find the schema version a data file declares.
///
/// Heuristic line scan, not JSON parsing: the first line that mentions
/// `schema` and splits into exactly two parts on `:` names the version,
/// with surrounding whitespace, quotes and commas removed. Falls back to
/// `default_tag` when no line qualifies.
pub fn scan_version_tag(data_path: &Path, default_tag: &str) -> io::Result<String> {
    let reader = BufReader::new(File::open(data_path)?);
    for line in reader.lines() {
        let line = line?;
        if !line.contains("schema") {
            continue;
        }
        let parts: Vec<&str> = line.split(':').collect();
        if let [_, value] = parts.as_slice() {
            let tag = value.trim_matches(|c: char| c == '"' || c == ',' || c.is_whitespace());
            if !tag.is_empty() {
                return Ok(tag.to_string());
            }
        }
    }
    Ok(default_tag.to_string())
}
