//! Capture epochs and per-epoch orbit membership.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{NoradId, OrbitId};

/// Generated identifier of a [`CaptureEpoch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EpochId(i64);

impl EpochId {
    /// Wraps a generated row identifier.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for EpochId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One ingestion run, anchored to a single wall-clock timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureEpoch {
    /// Generated identifier.
    pub id: EpochId,
    /// Wall-clock time of the run (Unix seconds).
    pub timestamp: f64,
    /// Run identifier used to correlate logs and reports.
    pub run_id: String,
}

/// How an object's orbit came to be listed in an epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipKind {
    /// A new element set was stored in this epoch.
    Measured,
    /// The feed re-published an orbit that was already stored.
    Unchanged,
    /// No element set arrived; the previous epoch's orbit was carried forward.
    Carried,
}

impl MembershipKind {
    /// Returns true if the membership reuses a previously stored orbit.
    #[must_use]
    pub const fn is_duplicate(self) -> bool {
        !matches!(self, Self::Measured)
    }

    /// Returns the kind as a string slice.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Measured => "measured",
            Self::Unchanged => "unchanged",
            Self::Carried => "carried",
        }
    }

    /// Parses a kind from its stored form.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "measured" => Some(Self::Measured),
            "unchanged" => Some(Self::Unchanged),
            "carried" => Some(Self::Carried),
            _ => None,
        }
    }
}

impl fmt::Display for MembershipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Association of an object, a capture epoch and the orbit valid for it.
///
/// At most one membership exists per `(norad_id, epoch_id)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochMembership {
    /// Object.
    pub norad_id: NoradId,
    /// Capture epoch.
    pub epoch_id: EpochId,
    /// Orbit listed for the object at this epoch.
    pub orbit_id: OrbitId,
    /// Whether the orbit is new at this epoch or reused.
    pub kind: MembershipKind,
}

impl EpochMembership {
    /// Returns true if this entry reuses a previously stored orbit.
    #[must_use]
    pub const fn is_duplicate(&self) -> bool {
        self.kind.is_duplicate()
    }
}

/// Membership breakdown of one capture epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochSummary {
    /// The epoch.
    pub epoch: CaptureEpoch,
    /// Objects with a newly stored orbit.
    pub measured: u64,
    /// Objects whose re-published orbit was already stored.
    pub unchanged: u64,
    /// Objects carried forward from the previous epoch.
    pub carried: u64,
}
