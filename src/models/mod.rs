//! Data models for satlog.
//!
//! This module contains the core data structures:
//!
//! - [`TrackedObject`], [`ObjectName`], [`CatalogRecord`]: the satellite catalog
//! - [`OrbitalState`]: element snapshots, append-only
//! - [`CaptureEpoch`], [`EpochMembership`]: per-run orbit history
//! - [`Subgroup`], [`SubgroupFeed`]: element feed organisation
//! - [`IngestReport`], [`CatalogSummary`]: run outcomes

mod epoch;
mod group;
mod object;
mod orbit;
mod report;

pub use epoch::{CaptureEpoch, EpochId, EpochMembership, EpochSummary, MembershipKind};
pub use group::{Subgroup, SubgroupDefinition, SubgroupFeed, SubgroupId};
pub use object::{
    CatalogRecord, NameSource, ObjectName, ReferenceCode, ReferenceKind, TrackedObject,
};
pub use orbit::{ElementSource, NoradId, OrbitId, OrbitalState};
pub use report::{CatalogSummary, IngestReport, SubgroupCount};
