//! # hflav-resolve
//!
//! Decides which JSON Schema validates an HFLAV data file and turns the
//! file into a [`hflav_schema::DynamicRecord`].
//!
//! - [`chain`]: the ordered resolution strategies (embedded schema,
//!   GitLab schema, inference from the template example).
//! - [`service`]: the caller-facing operations that combine record search,
//!   template selection, downloads and the chain.
//!
//! Both depend only on the repository traits in `hflav-core`, so the HTTP
//! clients in `hflav-client` and in-memory doubles are interchangeable.

pub mod chain;
pub mod error;
pub mod service;

pub use chain::{scan_version_tag, Attempt, SchemaResolutionChain, Strategy, DEFAULT_VERSION_TAG};
pub use error::ResolveError;
pub use service::HflavService;
