//! # Template Subcommand
//!
//! Shows which template version governs data created at a given date.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;

use hflav_resolve::HflavService;

/// Arguments for `hflav template`.
#[derive(Args, Debug)]
pub struct TemplateArgs {
    /// Date as `YYYY-MM-DD` or RFC 3339. Defaults to the latest template.
    #[arg(long, value_parser = crate::parse_date)]
    pub date: Option<DateTime<Utc>>,
}

/// Execute `hflav template`.
pub fn run_template(args: &TemplateArgs, service: &HflavService, out: &mut dyn Write) -> Result<u8> {
    let template = service
        .resolve_template(args.date)
        .context("resolving template version")?;
    tracing::info!(template = %template, "template found");
    crate::print_json(out, &template)?;
    Ok(0)
}
