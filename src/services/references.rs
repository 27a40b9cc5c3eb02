//! Reference codes and element-feed groups.

use serde::Serialize;

use crate::feeds::CatalogAbbreviations;
use crate::models::SubgroupFeed;
use crate::storage::CatalogSession;
use crate::Result;

/// Outcome of loading the abbreviation document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReferenceSummary {
    /// Reference codes inserted or updated.
    pub codes: u64,
    /// Subgroups inserted or updated.
    pub subgroups: u64,
    /// Subgroups skipped because their feed descriptor is unusable.
    pub skipped: u64,
}

/// Upserts every reference code and group/subgroup of the document.
///
/// Existing codes keep their identifiers, so objects referencing them stay
/// valid. A subgroup with an unusable feed descriptor is logged and skipped.
///
/// # Errors
///
/// Returns an error if a storage operation fails.
pub fn sync_references<S>(session: &S, abbreviations: &CatalogAbbreviations) -> Result<ReferenceSummary>
where
    S: CatalogSession + ?Sized,
{
    let mut summary = ReferenceSummary::default();

    for code in &abbreviations.codes {
        session.upsert_reference(code)?;
        summary.codes += 1;
    }

    for definition in &abbreviations.groups {
        let feed = match SubgroupFeed::parse(&definition.feed) {
            Ok(feed) => feed,
            Err(err) => {
                tracing::warn!(
                    group = %definition.group,
                    subgroup = %definition.subgroup,
                    error = %err,
                    "Skipping subgroup with unusable feed"
                );
                summary.skipped += 1;
                continue;
            },
        };
        let group_id = session.ensure_group(&definition.group)?;
        session.upsert_subgroup(group_id, &definition.subgroup, &feed)?;
        summary.subgroups += 1;
    }

    tracing::info!(
        codes = summary.codes,
        subgroups = summary.subgroups,
        skipped = summary.skipped,
        "Reference data loaded"
    );
    Ok(summary)
}
