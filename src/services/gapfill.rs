//! Epoch gap-filling.
//!
//! Element feeds do not list every object on every run. An object that was
//! listed in the previous capture epoch but not in the current one keeps its
//! previous orbit, carried forward as a duplicate membership, as long as
//! that orbit was genuinely measured recently enough.
//!
//! Every duplicate membership of the current epoch is rebuilt this way,
//! including orbits the merger matched against a re-published element set.
//! A feed that keeps re-publishing an old element set therefore stops
//! placing the object in new epochs once the orbit is too old.

use std::collections::HashSet;

use crate::config::IngestSettings;
use crate::models::{CaptureEpoch, EpochMembership, MembershipKind, NoradId, OrbitId};
use crate::storage::CatalogSession;
use crate::Result;

/// Carries orbits forward into epochs without a fresh observation.
#[derive(Debug, Clone, Copy)]
pub struct GapFiller {
    max_age_secs: f64,
}

impl Default for GapFiller {
    fn default() -> Self {
        Self::from_settings(&IngestSettings::default())
    }
}

impl GapFiller {
    /// Creates a gap-filler that stops carrying orbits older than `max_age_secs`.
    #[must_use]
    pub const fn new(max_age_secs: f64) -> Self {
        Self { max_age_secs }
    }

    /// Creates a gap-filler from ingest settings.
    #[must_use]
    pub fn from_settings(settings: &IngestSettings) -> Self {
        Self::new(settings.max_gap_fill_age_secs())
    }

    /// Fills the gaps of `epoch` from the epoch immediately before it.
    ///
    /// All duplicate memberships of `epoch` are removed first, both those
    /// carried by an earlier call and those the merger wrote for a reused
    /// orbit, so repeated calls give the same result. Returns the number of
    /// memberships carried forward.
    ///
    /// # Errors
    ///
    /// Returns an error if a storage operation fails.
    pub fn fill<S>(&self, session: &S, epoch: &CaptureEpoch) -> Result<u64>
    where
        S: CatalogSession + ?Sized,
    {
        // Orbits the merger matched keep their kind if they are carried again
        let reused: HashSet<(NoradId, OrbitId)> = session
            .memberships_for_epoch(epoch.id)?
            .into_iter()
            .filter(|membership| membership.kind == MembershipKind::Unchanged)
            .map(|membership| (membership.norad_id, membership.orbit_id))
            .collect();

        let cleared = session.delete_duplicate_memberships(epoch.id)?;
        if cleared > 0 {
            tracing::debug!(epoch_id = %epoch.id, cleared, "Cleared duplicate memberships");
        }

        let Some(previous) = session.previous_epoch(epoch)? else {
            tracing::debug!(epoch_id = %epoch.id, "No earlier epoch to fill from");
            return Ok(0);
        };

        let oldest_allowed = epoch.timestamp - self.max_age_secs;
        let mut carried = 0_u64;
        for missing in session.memberships_missing_from(previous.id, epoch.id)? {
            match session.genuine_origin(missing.orbit_id)? {
                Some(origin) if origin >= oldest_allowed => {},
                origin => {
                    tracing::debug!(
                        norad_id = %missing.norad_id,
                        orbit_id = %missing.orbit_id,
                        ?origin,
                        "Not carrying stale orbit forward"
                    );
                    continue;
                },
            }

            let kind = if reused.contains(&(missing.norad_id, missing.orbit_id)) {
                MembershipKind::Unchanged
            } else {
                MembershipKind::Carried
            };
            session.insert_membership(&EpochMembership {
                norad_id: missing.norad_id,
                epoch_id: epoch.id,
                orbit_id: missing.orbit_id,
                kind,
            })?;
            carried += 1;
        }

        metrics::counter!("ingest_gap_filled_total").increment(carried);
        tracing::info!(
            epoch_id = %epoch.id,
            previous_epoch_id = %previous.id,
            carried,
            "Gap-fill complete"
        );
        Ok(carried)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ElementSource, OrbitalState};
    use crate::storage::{SqliteSession, SqliteStore};

    const DAY: f64 = 86_400.0;
    const NOW: f64 = 1_700_000_000.0;

    fn orbit(session: &SqliteSession<'_>, norad: u32, timestamp: f64) -> OrbitId {
        let norad_id = NoradId::new(norad);
        session.insert_object_stub(norad_id).unwrap();
        session
            .insert_orbit(&OrbitalState {
                norad_id,
                epoch: timestamp - 3_600.0,
                inclination: 97.4,
                eccentricity: 0.001,
                raan: 0.0,
                arg_periapsis: 0.0,
                mean_anomaly: 0.0,
                mean_motion: 15.2,
                mean_motion_dot: 0.0,
                mean_motion_ddot: 0.0,
                bstar: 0.0,
                magnitude: None,
                source: ElementSource::Celestrak,
                rev_count: 1,
            })
            .unwrap()
    }

    fn member(
        session: &SqliteSession<'_>,
        norad: u32,
        epoch: &CaptureEpoch,
        orbit_id: OrbitId,
        kind: MembershipKind,
    ) {
        session
            .insert_membership(&EpochMembership {
                norad_id: NoradId::new(norad),
                epoch_id: epoch.id,
                orbit_id,
                kind,
            })
            .unwrap();
    }

    fn measured(session: &SqliteSession<'_>, norad: u32, epoch: &CaptureEpoch) -> OrbitId {
        let orbit_id = orbit(session, norad, epoch.timestamp);
        member(session, norad, epoch, orbit_id, MembershipKind::Measured);
        orbit_id
    }

    #[test]
    fn test_first_epoch_has_nothing_to_fill() {
        let mut store = SqliteStore::in_memory().unwrap();
        let session = store.begin().unwrap();
        let epoch = session.insert_epoch(NOW, "only").unwrap();
        assert_eq!(GapFiller::default().fill(&session, &epoch).unwrap(), 0);
    }

    #[test]
    fn test_recent_orbit_is_carried_and_stale_orbit_is_not() {
        let mut store = SqliteStore::in_memory().unwrap();
        let session = store.begin().unwrap();

        let eleven_days_ago = session.insert_epoch(NOW - 11.0 * DAY, "a").unwrap();
        let stale_orbit = measured(&session, 1, &eleven_days_ago);
        let three_days_ago = session.insert_epoch(NOW - 3.0 * DAY, "b").unwrap();
        let fresh_orbit = measured(&session, 2, &three_days_ago);
        session
            .insert_membership(&EpochMembership {
                norad_id: NoradId::new(1),
                epoch_id: three_days_ago.id,
                orbit_id: stale_orbit,
                kind: MembershipKind::Carried,
            })
            .unwrap();

        let now = session.insert_epoch(NOW, "c").unwrap();
        let carried = GapFiller::default().fill(&session, &now).unwrap();

        assert_eq!(carried, 1);
        let memberships = session.memberships_for_epoch(now.id).unwrap();
        assert_eq!(memberships.len(), 1);
        assert_eq!(memberships[0].norad_id, NoradId::new(2));
        assert_eq!(memberships[0].orbit_id, fresh_orbit);
        assert_eq!(memberships[0].kind, MembershipKind::Carried);
    }

    #[test]
    fn test_repeated_fill_keeps_one_membership_per_object() {
        let mut store = SqliteStore::in_memory().unwrap();
        let session = store.begin().unwrap();
        let earlier = session.insert_epoch(NOW - DAY, "a").unwrap();
        measured(&session, 5, &earlier);
        measured(&session, 6, &earlier);
        let now = session.insert_epoch(NOW, "b").unwrap();
        let filler = GapFiller::default();

        for _ in 0..3 {
            assert_eq!(filler.fill(&session, &now).unwrap(), 2);
        }
        assert_eq!(session.memberships_for_epoch(now.id).unwrap().len(), 2);
    }

    #[test]
    fn test_objects_seen_in_current_epoch_are_left_alone() {
        let mut store = SqliteStore::in_memory().unwrap();
        let session = store.begin().unwrap();
        let earlier = session.insert_epoch(NOW - DAY, "a").unwrap();
        measured(&session, 9, &earlier);
        let now = session.insert_epoch(NOW, "b").unwrap();
        measured(&session, 9, &now);

        assert_eq!(GapFiller::default().fill(&session, &now).unwrap(), 0);
        let memberships = session.memberships_for_epoch(now.id).unwrap();
        assert_eq!(memberships.len(), 1);
        assert_eq!(memberships[0].kind, MembershipKind::Measured);
    }

    #[test]
    fn test_stale_reused_orbit_is_cleared() {
        let mut store = SqliteStore::in_memory().unwrap();
        let session = store.begin().unwrap();
        let first = session.insert_epoch(NOW - 20.0 * DAY, "a").unwrap();
        let orbit_id = measured(&session, 7, &first);
        let yesterday = session.insert_epoch(NOW - DAY, "b").unwrap();
        member(&session, 7, &yesterday, orbit_id, MembershipKind::Unchanged);
        let now = session.insert_epoch(NOW, "c").unwrap();
        member(&session, 7, &now, orbit_id, MembershipKind::Unchanged);

        assert_eq!(GapFiller::default().fill(&session, &now).unwrap(), 0);
        assert!(session.memberships_for_epoch(now.id).unwrap().is_empty());
    }

    #[test]
    fn test_fresh_reused_orbit_stays_unchanged() {
        let mut store = SqliteStore::in_memory().unwrap();
        let session = store.begin().unwrap();
        let earlier = session.insert_epoch(NOW - 2.0 * DAY, "a").unwrap();
        let orbit_id = measured(&session, 7, &earlier);
        let now = session.insert_epoch(NOW, "b").unwrap();
        member(&session, 7, &now, orbit_id, MembershipKind::Unchanged);

        assert_eq!(GapFiller::default().fill(&session, &now).unwrap(), 1);
        let membership = session.get_membership(NoradId::new(7), now.id).unwrap().unwrap();
        assert_eq!(membership.orbit_id, orbit_id);
        assert_eq!(membership.kind, MembershipKind::Unchanged);
    }

    #[test]
    fn test_orbit_never_measured_is_not_carried() {
        let mut store = SqliteStore::in_memory().unwrap();
        let session = store.begin().unwrap();
        let earlier = session.insert_epoch(NOW - DAY, "a").unwrap();
        let orbit_id = orbit(&session, 3, earlier.timestamp);
        member(&session, 3, &earlier, orbit_id, MembershipKind::Carried);
        assert!(session.genuine_origin(orbit_id).unwrap().is_none());

        let now = session.insert_epoch(NOW, "b").unwrap();
        assert_eq!(GapFiller::default().fill(&session, &now).unwrap(), 0);
        assert!(session.get_membership(NoradId::new(3), now.id).unwrap().is_none());
    }
}
