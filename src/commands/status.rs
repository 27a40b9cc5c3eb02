//! Status command handler.

use chrono::{DateTime, Utc};
use satlog::{CatalogSession, SatlogConfig};

use super::{CommandResult, OutputFormat, open_store};

/// Status command.
pub fn cmd_status(config: &SatlogConfig, limit: usize, format: OutputFormat) -> CommandResult {
    let mut store = open_store(config)?;
    let schema_version = store.schema_version()?;
    let epochs = {
        let session = store.begin()?;
        session.recent_epochs(limit)?
    };

    if format == OutputFormat::Json {
        let output = serde_json::json!({
            "database": config.db_path().display().to_string(),
            "schema_version": schema_version,
            "epochs": epochs,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("Satlog Status");
    println!("=============");
    println!();
    println!("Database: {}", config.db_path().display());
    println!("Schema version: {schema_version}");
    println!();

    if epochs.is_empty() {
        println!("No capture epochs recorded yet.");
        return Ok(());
    }

    println!("Recent capture epochs:");
    for summary in &epochs {
        let when = format_timestamp(summary.epoch.timestamp);
        println!(
            "  #{:<6} {when}  measured {:>6}  unchanged {:>6}  carried {:>6}",
            summary.epoch.id, summary.measured, summary.unchanged, summary.carried
        );
    }
    Ok(())
}

#[allow(clippy::cast_possible_truncation)]
fn format_timestamp(timestamp: f64) -> String {
    DateTime::<Utc>::from_timestamp(timestamp.floor() as i64, 0).map_or_else(
        || format!("{timestamp:.0}"),
        |dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}
