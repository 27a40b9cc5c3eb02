//! Binary entry point for satlog.
//!
//! This binary provides the CLI interface for the satlog ingester.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow needless_pass_by_value for command functions
#![allow(clippy::needless_pass_by_value)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use commands::{
    ConfigFormat, OutputFormat, cmd_catalog, cmd_config, cmd_decode, cmd_ingest, cmd_status,
};
use satlog::SatlogConfig;
use satlog::observability;

/// Satlog - satellite catalog and orbital-element history ingester.
#[derive(Parser)]
#[command(name = "satlog")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Refresh the catalog, then record a capture epoch from every element feed.
    Ingest {
        /// Record elements against the stored catalog without refreshing it.
        #[arg(long)]
        skip_catalog: bool,

        /// Report format.
        #[arg(short, long, value_enum, default_value_t)]
        format: OutputFormat,
    },

    /// Refresh reference codes, catalog records and annex names.
    Catalog {
        /// Report format.
        #[arg(short, long, value_enum, default_value_t)]
        format: OutputFormat,
    },

    /// Decode a local element file and print the orbits as JSON.
    Decode {
        /// Element file to decode.
        file: PathBuf,

        /// Subgroup the file belongs to, for magnitude overrides.
        #[arg(short, long)]
        subgroup: Option<String>,
    },

    /// Show recent capture epochs.
    Status {
        /// Number of epochs to list.
        #[arg(short, long, default_value = "10")]
        limit: usize,

        /// Output format.
        #[arg(short, long, value_enum, default_value_t)]
        format: OutputFormat,
    },

    /// Show the effective configuration.
    Config {
        /// Output format.
        #[arg(short, long, value_enum, default_value_t)]
        format: ConfigFormat,
    },
}

/// Main entry point.
fn main() -> ExitCode {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = match SatlogConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };

    let mut observability =
        match observability::init_from_config(&config.observability, cli.verbose) {
            Ok(handle) => handle,
            Err(e) => {
                eprintln!("Failed to initialize observability: {e}");
                return ExitCode::FAILURE;
            },
        };

    let result = run_command(cli.command, &config);
    observability.shutdown();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        },
    }
}

/// Runs the selected command.
fn run_command(command: Commands, config: &SatlogConfig) -> commands::CommandResult {
    match command {
        Commands::Ingest {
            skip_catalog,
            format,
        } => cmd_ingest(config, skip_catalog, format),

        Commands::Catalog { format } => cmd_catalog(config, format),

        Commands::Decode { file, subgroup } => cmd_decode(config, &file, subgroup.as_deref()),

        Commands::Status { limit, format } => cmd_status(config, limit, format),

        Commands::Config { format } => cmd_config(config, format),
    }
}
