//! Decode command handler.

use std::path::Path;

use satlog::SatlogConfig;
use satlog::feeds::{DecodeContext, MagnitudeTable, read_element_file};
use satlog::models::{ElementSource, OrbitalState};

use super::CommandResult;

/// Decode command.
///
/// Decodes a local element file without touching the catalog and prints
/// the decoded orbits as JSON.
pub fn cmd_decode(config: &SatlogConfig, path: &Path, subgroup: Option<&str>) -> CommandResult {
    let magnitudes = MagnitudeTable::new();
    let context = DecodeContext {
        magnitudes: &magnitudes,
        magnitude_overrides: &config.ingest.magnitude_overrides,
        subgroup,
        source: ElementSource::Celestrak,
    };

    let file = read_element_file(path, &context)?;
    let orbits: Vec<&OrbitalState> = file.records.iter().map(|record| &record.state).collect();
    let output = serde_json::json!({
        "file": path.display().to_string(),
        "records": orbits,
        "malformed": file.malformed,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
