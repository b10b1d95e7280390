//! # hflav-schema: Validation, Inference & Dynamic Records
//!
//! Turns a downloaded HFLAV data file of unknown shape into a navigable,
//! read-only [`DynamicRecord`], optionally checking it against a JSON Schema
//! first.
//!
//! ## Structural Validation (`validate`)
//!
//! [`StructuralValidator`] compiles a JSON Schema with the `jsonschema` crate
//! and reports every violation with its instance path, schema path and
//! message. Remote `$ref`s are never fetched.
//!
//! ## Schema-by-Example (`infer`)
//!
//! [`infer::infer`] derives a schema from an example document. Every object
//! node is closed (`additionalProperties: false`) and no property is
//! required, so data may omit template fields but may not add unknown ones.
//!
//! ## Conversion (`builder`, `record`)
//!
//! [`DynamicModelBuilder`] ties the two together: load, validate against an
//! injected or inferred schema, convert.

pub mod builder;
pub mod error;
pub mod infer;
pub mod record;
pub mod validate;

pub use builder::DynamicModelBuilder;
pub use error::ConversionError;
pub use record::{DynamicObject, DynamicRecord};
pub use validate::{StructuralValidator, ValidationViolations, Violation};

/// `$schema` URI stamped on every synthesized schema.
pub const DRAFT_07_URI: &str = "http://json-schema.org/draft-07/schema#";
