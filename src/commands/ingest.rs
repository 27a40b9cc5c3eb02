//! Ingest command handler.

use satlog::services::IngestService;
use satlog::{CatalogSession, SatlogConfig, current_timestamp};

use super::catalog::refresh_catalog;
use super::{CommandResult, OutputFormat, acquisition, open_store};

/// Ingest command.
///
/// Refreshes the catalog unless `skip_catalog` is set, then records one
/// capture epoch from every element feed.
pub fn cmd_ingest(config: &SatlogConfig, skip_catalog: bool, format: OutputFormat) -> CommandResult {
    let mut store = open_store(config)?;
    let acquisition = acquisition(config);

    if skip_catalog {
        tracing::info!("Skipping catalog refresh");
    } else {
        let summary = refresh_catalog(config, &acquisition, &mut store)?;
        if format == OutputFormat::Text {
            println!("{summary}");
        }
    }

    // Dropping the read session rolls it back
    let subgroups = {
        let session = store.begin()?;
        session.list_subgroups()?
    };
    let magnitudes = acquisition.magnitudes();
    let batches = acquisition.element_batches(&subgroups, &magnitudes);

    let session = store.begin()?;
    let report = IngestService::new(&config.ingest).run(&session, &batches, current_timestamp())?;
    session.commit()?;

    match format {
        OutputFormat::Text => print!("{report}"),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}
