//! Catalog command handler.

use satlog::SatlogConfig;
use satlog::feeds::load_abbreviations;
use satlog::fetch::HttpTransport;
use satlog::models::CatalogSummary;
use satlog::services::{CatalogReconciler, FeedAcquisition, NameNormalizer, sync_references};
use satlog::storage::SqliteStore;

use super::{CommandResult, OutputFormat, acquisition, open_store};

/// Catalog command.
pub fn cmd_catalog(config: &SatlogConfig, format: OutputFormat) -> CommandResult {
    let mut store = open_store(config)?;
    let summary = refresh_catalog(config, &acquisition(config), &mut store)?;

    match format {
        OutputFormat::Text => println!("{summary}"),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
    }
    Ok(())
}

/// Refreshes reference codes, catalog records and annex names in one transaction.
///
/// Feeds are retrieved before the transaction is opened. A missing
/// abbreviations document leaves the reference tables as they are.
pub(super) fn refresh_catalog(
    config: &SatlogConfig,
    acquisition: &FeedAcquisition<HttpTransport>,
    store: &mut SqliteStore,
) -> satlog::Result<CatalogSummary> {
    let abbreviations_path = &config.catalog.abbreviations_path;
    let abbreviations = if abbreviations_path.exists() {
        Some(load_abbreviations(abbreviations_path)?)
    } else {
        tracing::warn!(
            path = %abbreviations_path.display(),
            "Abbreviations document not found, keeping stored reference codes and subgroups"
        );
        None
    };

    let catalog = acquisition.catalog()?;
    let annex = acquisition.annex(config.catalog.extra_names_path.as_deref())?;

    let reconciler = CatalogReconciler::new(NameNormalizer::from_settings(&config.ingest));
    let session = store.begin()?;

    if let Some(abbreviations) = &abbreviations {
        let references = sync_references(&session, abbreviations)?;
        tracing::info!(
            codes = references.codes,
            subgroups = references.subgroups,
            skipped = references.skipped,
            "Reference codes synchronized"
        );
    }

    let mut summary = reconciler.reconcile(&session, &catalog.records)?;
    if let Some(entries) = &annex {
        summary.annex_names = reconciler.apply_annex(&session, entries)?;
    }
    session.commit()?;

    tracing::info!(
        records = summary.records,
        created = summary.created,
        collisions = summary.collisions,
        annex_names = summary.annex_names,
        "Catalog refresh complete"
    );
    Ok(summary)
}
