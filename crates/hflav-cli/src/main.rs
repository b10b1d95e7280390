//! # hflav CLI entry point
//!
//! Parses command-line arguments, initialises tracing, loads configuration
//! and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use hflav_cli::data::{run_infer, run_load, run_local, InferArgs, LoadArgs, LocalArgs};
use hflav_cli::search::{run_search, SearchArgs};
use hflav_cli::template::{run_template, TemplateArgs};
use hflav_client::HflavConfig;

/// HFLAV FAIR client.
///
/// Searches HFLAV averages published on Zenodo and loads data files,
/// validating them against the schema of the template they were made with.
#[derive(Parser, Debug)]
#[command(name = "hflav", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit log events as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    /// Path to a YAML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search records in the HFLAV Zenodo community.
    Search(SearchArgs),

    /// Download a data file of a record and validate it.
    Load(LoadArgs),

    /// Validate a data file on the local filesystem.
    Local(LocalArgs),

    /// Show the template version in force at a date.
    Template(TemplateArgs),

    /// Print the JSON Schema inferred from an example document.
    Infer(InferArgs),
}

fn init_tracing(verbose: u8, json: bool) {
    // RUST_LOG wins over -v when set.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        })
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn run(cli: Cli) -> anyhow::Result<u8> {
    let config = HflavConfig::load(cli.config.as_deref()).context("loading configuration")?;
    tracing::debug!(config = ?config, "configuration loaded");
    let service = hflav_cli::build_service(&config)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match &cli.command {
        Commands::Search(args) => run_search(args, &service, &mut out),
        Commands::Load(args) => run_load(args, &service, &mut out),
        Commands::Local(args) => run_local(args, &service, &mut out),
        Commands::Template(args) => run_template(args, &service, &mut out),
        Commands::Infer(args) => run_infer(args, &service, &mut out),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    tracing::debug!("hflav CLI v{} starting", env!("CARGO_PKG_VERSION"));

    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
