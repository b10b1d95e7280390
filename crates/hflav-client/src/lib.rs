//! # hflav-client: Zenodo and GitLab access for HFLAV data
//!
//! Blocking HTTP clients implementing the repository traits of `hflav-core`:
//!
//! - [`ZenodoClient`] implements `RecordRepository`: record search, record
//!   fetch, template version selection, streamed file download.
//! - [`GitLabClient`] implements `SchemaRepository`: locates the schema file
//!   in the companion repository and fetches it at a version tag.
//!
//! ## Errors
//!
//! Every failure is mapped into `hflav_core::SourceError`. Transport failures
//! are retried with exponential backoff (200ms, 400ms, 800ms) before being
//! surfaced as `DataAccess`; HTTP status errors are never retried.
//!
//! ## Configuration
//!
//! [`HflavConfig`] layers defaults, an optional YAML file and `HFLAV_*`
//! environment variables.

pub mod config;
pub mod gitlab;
pub(crate) mod http;
pub(crate) mod retry;
pub mod zenodo;

pub use config::{ConfigError, HflavConfig};
pub use gitlab::GitLabClient;
pub use zenodo::ZenodoClient;
