//! # Satlog
//!
//! Satellite catalog and orbital-element history ingester.
//!
//! Satlog pulls the public satellite catalog (SATCAT), its name annex and
//! two-line element sets from external feeds, reconciles them against what
//! it already knows, and keeps a deduplicated history of every object's
//! orbit, one capture epoch per ingestion run.
//!
//! ## Features
//!
//! - Positional decoding of two-line element sets, including the
//!   implied-decimal exponent fields
//! - Recursive decomposition of catalog names into canonical and alternate names
//! - Secondary-key (COSPAR) collision resolution
//! - Orbit deduplication with a configurable epoch tolerance
//! - Gap-filling of epochs in which an object was not re-observed
//! - Embedded `SQLite` storage, one transaction per run
//!
//! ## Example
//!
//! ```rust,ignore
//! use satlog::services::IngestService;
//! use satlog::storage::SqliteStore;
//!
//! let mut store = SqliteStore::open("satlog.db")?;
//! let session = store.begin()?;
//! let report = IngestService::new(&config.ingest).run(&session, &batches, now)?;
//! session.commit()?;
//! println!("{report}");
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

// Module declarations
pub mod config;
pub mod feeds;
pub mod fetch;
pub mod models;
pub mod observability;
pub mod services;
pub mod storage;

// Re-exports for convenience
pub use config::{IngestSettings, SatlogConfig};
pub use feeds::DecodeError;
pub use models::{
    CaptureEpoch, EpochId, EpochMembership, IngestReport, MembershipKind, NoradId, ObjectName,
    OrbitId, OrbitalState, TrackedObject,
};
pub use services::{CatalogReconciler, GapFiller, IngestService, NameNormalizer, OrbitMerger};
pub use storage::{CatalogSession, SqliteSession, SqliteStore};

/// Error type for satlog operations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidInput` | Malformed configuration values, unreadable feed documents |
/// | `OperationFailed` | `SQLite` failures, filesystem I/O errors |
/// | `Decode` | A two-line element record cannot be decoded |
/// | `Fetch` | A feed could not be retrieved and no cached copy exists |
#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid input was provided.
    ///
    /// Raised when:
    /// - A configuration file contains an unusable value
    /// - The XML abbreviations document cannot be parsed
    /// - A subgroup feed descriptor is neither a file name nor a JSON list
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An operation failed.
    ///
    /// Raised when:
    /// - `SQLite` statements or transactions fail
    /// - Filesystem I/O errors occur
    /// - Observability components fail to initialize
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// A two-line element record could not be decoded.
    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),

    /// A remote feed could not be fetched and no local copy is available.
    #[error("fetch of '{url}' failed: {cause}")]
    Fetch {
        /// The remote locator.
        url: String,
        /// The underlying cause.
        cause: String,
    },
}

/// Result type alias for satlog operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Returns the current Unix timestamp in (fractional) seconds.
///
/// Falls back to 0 if the system clock is before the Unix epoch.
#[must_use]
pub fn current_timestamp() -> f64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}
