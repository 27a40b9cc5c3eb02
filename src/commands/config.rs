//! Config command handler.
//!
//! Prints the effective configuration after file and environment overrides.
//! Secrets are redacted by the serializer.

use satlog::SatlogConfig;

use super::{CommandResult, ConfigFormat};

/// Config command.
pub fn cmd_config(config: &SatlogConfig, format: ConfigFormat) -> CommandResult {
    let rendered = match format {
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
    };
    println!("{}", rendered.trim_end());
    Ok(())
}
