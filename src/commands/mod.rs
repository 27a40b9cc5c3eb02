//! Command handlers module.
//!
//! This module organizes the CLI command implementations into separate files:
//! - `catalog.rs`: Catalog refresh (reference codes, SATCAT, annex)
//! - `ingest.rs`: Full ingestion run
//! - `decode.rs`: Offline decoding of an element file
//! - `status.rs`: Recent capture epochs
//! - `config.rs`: Configuration display command

mod catalog;
mod config;
mod decode;
mod ingest;
mod status;

use clap::ValueEnum;
use satlog::SatlogConfig;
use satlog::fetch::HttpTransport;
use satlog::services::FeedAcquisition;
use satlog::storage::SqliteStore;

// Re-export command functions
pub use catalog::cmd_catalog;
pub use config::cmd_config;
pub use decode::cmd_decode;
pub use ingest::cmd_ingest;
pub use status::cmd_status;

/// Result type shared by command handlers.
pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Output format of report-producing commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human readable text.
    #[default]
    Text,
    /// JSON document.
    Json,
}

/// Output format of the `config` command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ConfigFormat {
    /// TOML, as accepted by the config file.
    #[default]
    Toml,
    /// JSON document.
    Json,
}

/// Opens the catalog database named by the configuration.
fn open_store(config: &SatlogConfig) -> satlog::Result<SqliteStore> {
    let path = config.db_path();
    tracing::debug!(path = %path.display(), "Opening catalog database");
    SqliteStore::open(path)
}

/// Creates a feed acquisition over HTTP.
fn acquisition(config: &SatlogConfig) -> FeedAcquisition<HttpTransport> {
    FeedAcquisition::new(config, HttpTransport::new(config.fetch.timeout()))
}
