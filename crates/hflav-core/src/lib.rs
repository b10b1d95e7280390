//! # hflav-core: Foundational Types for the HFLAV FAIR Client
//!
//! Defines the vocabulary shared by every other crate in the workspace:
//! Zenodo record and template descriptors, the source error taxonomy, the
//! capability traits through which remote data is reached, and the search
//! query builder.
//!
//! ## Key Design Principles
//!
//! 1. **Typed identifiers.** Zenodo record ids are [`RecordId`] values, never
//!    bare integers. Id `0` is rejected at the repository boundary.
//!
//! 2. **Capability markers are fixed at construction.** A
//!    [`TemplateDescriptor`] derives its embedded-schema and template-file
//!    markers from the record's file listing once and never mutates them.
//!
//! 3. **Capability traits, not concrete clients.** Schema resolution depends
//!    only on [`RecordRepository`] and [`SchemaRepository`]; HTTP clients live
//!    in `hflav-client` and tests substitute in-memory implementations.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `hflav-*` crates (this is the leaf of the DAG).
//! - No I/O. No `.unwrap()` outside tests.

pub mod error;
pub mod identity;
pub mod model;
pub mod query;
pub mod source;

pub use error::SourceError;
pub use identity::RecordId;
pub use model::{FileReference, RecordDescriptor, TemplateDescriptor};
pub use query::{Combinator, Filter, QueryBuilder, SearchQuery, SortOption};
pub use source::{RecordRepository, SchemaRepository};
