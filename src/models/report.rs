//! Run reports.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::EpochId;

/// Number of objects recorded in one subgroup during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubgroupCount {
    /// Parent group name.
    pub group: String,
    /// Subgroup name.
    pub subgroup: String,
    /// Objects recorded as members this run.
    pub objects: u64,
}

/// Outcome of one element ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestReport {
    /// Run identifier.
    pub run_id: String,
    /// Capture epoch created by the run.
    pub epoch_id: Option<EpochId>,
    /// Wall-clock time of the capture epoch (Unix seconds).
    pub epoch_timestamp: f64,
    /// Element sets received for objects present in the catalog.
    pub downloaded: u64,
    /// Element sets stored as new orbits.
    pub inserted: u64,
    /// Element sets matching an orbit that was already stored.
    pub unchanged: u64,
    /// Orbits carried forward for objects missing from this run.
    pub duplicated: u64,
    /// Element records that could not be decoded.
    pub malformed: u64,
    /// Per-subgroup member counts.
    pub subgroups: Vec<SubgroupCount>,
}

impl fmt::Display for IngestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Run {}", self.run_id)?;
        if let Some(epoch_id) = self.epoch_id {
            writeln!(f, "Capture epoch: {epoch_id}")?;
        }
        writeln!(f, "Downloaded elements: {}", self.downloaded)?;
        writeln!(f, "Unchanged elements: {}", self.unchanged)?;
        writeln!(f, "Inserted elements: {}", self.inserted)?;
        writeln!(f, "Duplicate elements: {}", self.duplicated)?;
        if self.malformed > 0 {
            writeln!(f, "Malformed records: {}", self.malformed)?;
        }
        for count in &self.subgroups {
            writeln!(
                f,
                " {:24} {:58} -- {:6} spacecraft",
                count.group, count.subgroup, count.objects
            )?;
        }
        Ok(())
    }
}

/// Outcome of one catalog refresh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSummary {
    /// Catalog records processed.
    pub records: u64,
    /// Objects seen for the first time.
    pub created: u64,
    /// Objects deleted because another object took over their secondary key.
    pub collisions: u64,
    /// Annex names inserted.
    pub annex_names: u64,
}

impl fmt::Display for CatalogSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} catalog records ({} new, {} collisions), {} annex names",
            self.records, self.created, self.collisions, self.annex_names
        )
    }
}
