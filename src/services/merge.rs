//! Orbit history merge.
//!
//! Feeds re-publish the same element set for days. A candidate whose epoch
//! lies within the tolerance of a stored orbit of the same object is the
//! same orbit: the stored one is listed again for the current capture
//! epoch instead of storing a copy.

use crate::config::IngestSettings;
use crate::feeds::DecodedElements;
use crate::models::{CaptureEpoch, EpochMembership, MembershipKind, OrbitId};
use crate::storage::CatalogSession;
use crate::Result;

/// What the merger did with one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The object is not in the catalog; the candidate was discarded.
    UnknownObject,
    /// The object already has an orbit listed for this capture epoch.
    AlreadyRecorded,
    /// A stored orbit matched; it was listed again.
    Unchanged(OrbitId),
    /// No stored orbit matched; the candidate was stored.
    Inserted(OrbitId),
}

impl MergeOutcome {
    /// Returns true if the candidate belongs to a known object.
    #[must_use]
    pub const fn is_download(self) -> bool {
        !matches!(self, Self::UnknownObject)
    }

    /// Returns the outcome as a string slice.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UnknownObject => "unknown_object",
            Self::AlreadyRecorded => "already_recorded",
            Self::Unchanged(_) => "unchanged",
            Self::Inserted(_) => "inserted",
        }
    }
}

/// Merges decoded element sets into the orbit history.
#[derive(Debug, Clone, Copy)]
pub struct OrbitMerger {
    tolerance: f64,
}

impl Default for OrbitMerger {
    fn default() -> Self {
        Self::from_settings(&IngestSettings::default())
    }
}

impl OrbitMerger {
    /// Creates a merger with an epoch tolerance in seconds.
    #[must_use]
    pub const fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    /// Creates a merger from ingest settings.
    #[must_use]
    pub const fn from_settings(settings: &IngestSettings) -> Self {
        Self::new(settings.epoch_tolerance_secs)
    }

    /// Returns the epoch tolerance in seconds.
    #[must_use]
    pub const fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Merges one candidate into the history of the current capture epoch.
    ///
    /// # Errors
    ///
    /// Returns an error if a storage operation fails.
    pub fn merge<S>(
        &self,
        session: &S,
        epoch: &CaptureEpoch,
        candidate: &DecodedElements,
    ) -> Result<MergeOutcome>
    where
        S: CatalogSession + ?Sized,
    {
        let norad_id = candidate.norad_id;
        let outcome = if !session.object_exists(norad_id)? {
            tracing::debug!(norad_id = %norad_id, "Discarding elements for uncatalogued object");
            MergeOutcome::UnknownObject
        } else if session.get_membership(norad_id, epoch.id)?.is_some() {
            MergeOutcome::AlreadyRecorded
        } else {
            let (orbit_id, kind, outcome) =
                match session.find_orbit_near(norad_id, candidate.state.epoch, self.tolerance)? {
                    Some(orbit_id) => (
                        orbit_id,
                        MembershipKind::Unchanged,
                        MergeOutcome::Unchanged(orbit_id),
                    ),
                    None => {
                        let orbit_id = session.insert_orbit(&candidate.state)?;
                        (orbit_id, MembershipKind::Measured, MergeOutcome::Inserted(orbit_id))
                    },
                };
            session.insert_membership(&EpochMembership {
                norad_id,
                epoch_id: epoch.id,
                orbit_id,
                kind,
            })?;
            outcome
        };

        metrics::counter!("ingest_elements_total", "outcome" => outcome.as_str()).increment(1);
        Ok(outcome)
    }
}
