//! Business logic services.
//!
//! Services operate on a [`crate::storage::CatalogSession`] handed in by the
//! caller; none of them opens or commits transactions.
//!
//! - [`NameNormalizer`]: decomposes names and keeps one canonical name per object
//! - [`CatalogReconciler`]: applies catalog records and annex names
//! - [`OrbitMerger`]: adds element sets to the orbit history without copies
//! - [`GapFiller`]: carries orbits into epochs without fresh observations
//! - [`IngestService`]: one full element ingestion run
//! - [`FeedAcquisition`]: retrieves and parses the feeds of a run

mod acquisition;
mod catalog;
mod gapfill;
mod ingest;
mod merge;
mod names;
mod references;

pub use acquisition::FeedAcquisition;
pub use catalog::{CatalogReconciler, RecordOutcome};
pub use gapfill::GapFiller;
pub use ingest::{FeedBatch, FeedEntry, IngestService};
pub use merge::{MergeOutcome, OrbitMerger};
pub use names::{NameComponent, NameNormalizer, contains_marker, decompose_name};
pub use references::{ReferenceSummary, sync_references};
