//! # Data Subcommands
//!
//! Loading HFLAV data files, remote or local, and schema inference.
//!
//! - `hflav load <record-id> <filename>` downloads a file of a published
//!   record and resolves its schema through the resolution chain.
//! - `hflav local <path>` validates a file already on disk.
//! - `hflav infer <path>` prints the schema inferred from an example file.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use hflav_core::RecordId;
use hflav_resolve::HflavService;

/// Arguments for `hflav load`.
#[derive(Args, Debug)]
pub struct LoadArgs {
    /// Zenodo record id.
    pub record_id: RecordId,

    /// Name of the file inside the record.
    pub filename: String,

    /// Directory or file path to download to.
    #[arg(long)]
    pub dest: Option<PathBuf>,
}

/// Arguments for `hflav local`.
#[derive(Args, Debug)]
pub struct LocalArgs {
    /// Path of the JSON data file.
    pub path: PathBuf,

    /// JSON Schema file to validate against. Without one the schema is
    /// inferred from the data file itself.
    #[arg(long)]
    pub schema: Option<PathBuf>,

    /// Skip validation and only parse the file.
    #[arg(long)]
    pub no_validate: bool,
}

/// Arguments for `hflav infer`.
#[derive(Args, Debug)]
pub struct InferArgs {
    /// Example JSON document.
    pub path: PathBuf,
}

/// Execute `hflav load`.
pub fn run_load(args: &LoadArgs, service: &HflavService, out: &mut dyn Write) -> Result<u8> {
    let record = service
        .load_data_file(args.record_id, &args.filename, args.dest.as_deref())
        .with_context(|| format!("loading '{}' from record {}", args.filename, args.record_id))?;
    crate::print_json(out, &record)?;
    Ok(0)
}

/// Execute `hflav local`.
pub fn run_local(args: &LocalArgs, service: &HflavService, out: &mut dyn Write) -> Result<u8> {
    let record = service
        .load_local_data_file(&args.path, args.schema.as_deref(), !args.no_validate)
        .with_context(|| format!("loading {}", args.path.display()))?;
    crate::print_json(out, &record)?;
    Ok(0)
}

/// Execute `hflav infer`.
pub fn run_infer(args: &InferArgs, service: &HflavService, out: &mut dyn Write) -> Result<u8> {
    let schema = service
        .infer_schema(&args.path)
        .with_context(|| format!("inferring schema from {}", args.path.display()))?;
    crate::print_json(out, &schema)?;
    Ok(0)
}
