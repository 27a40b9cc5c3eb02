//! Catalog reconciliation.
//!
//! Brings the stored objects in line with the master catalog and its annex.
//! The catalog is authoritative: attributes are replaced wholesale, and when
//! two objects claim the same COSPAR designator the object named by the
//! incoming record wins and the other one is deleted.

use crate::feeds::AnnexEntry;
use crate::models::{CatalogRecord, CatalogSummary, NameSource, ReferenceKind, TrackedObject};
use crate::services::NameNormalizer;
use crate::storage::CatalogSession;
use crate::Result;

/// What happened to one catalog record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordOutcome {
    /// The object did not exist before.
    pub created: bool,
    /// Objects deleted because they held the record's COSPAR designator.
    pub collisions: u64,
}

/// Service reconciling catalog records against stored objects.
#[derive(Debug, Clone, Default)]
pub struct CatalogReconciler {
    normalizer: NameNormalizer,
}

impl CatalogReconciler {
    /// Creates a reconciler storing names through `normalizer`.
    #[must_use]
    pub const fn new(normalizer: NameNormalizer) -> Self {
        Self { normalizer }
    }

    /// Returns the name normalizer.
    #[must_use]
    pub const fn normalizer(&self) -> &NameNormalizer {
        &self.normalizer
    }

    /// Reconciles every record of a catalog, in order.
    ///
    /// # Errors
    ///
    /// Returns an error if a storage operation fails.
    pub fn reconcile<S>(&self, session: &S, records: &[CatalogRecord]) -> Result<CatalogSummary>
    where
        S: CatalogSession + ?Sized,
    {
        let mut summary = CatalogSummary::default();
        for record in records {
            let outcome = self.reconcile_record(session, record)?;
            summary.records += 1;
            summary.created += u64::from(outcome.created);
            summary.collisions += outcome.collisions;
        }

        tracing::info!(
            records = summary.records,
            created = summary.created,
            collisions = summary.collisions,
            "Catalog reconciled"
        );
        Ok(summary)
    }

    /// Reconciles one catalog record.
    ///
    /// Ensures the object exists, deletes other objects holding the same
    /// COSPAR designator, overwrites every attribute, clears the debris flag
    /// and replaces the object's catalog names with the record's name.
    ///
    /// # Errors
    ///
    /// Returns an error if a storage operation fails.
    pub fn reconcile_record<S>(&self, session: &S, record: &CatalogRecord) -> Result<RecordOutcome>
    where
        S: CatalogSession + ?Sized,
    {
        let norad_id = record.norad_id;
        let mut outcome = RecordOutcome::default();

        if !session.object_exists(norad_id)? {
            session.insert_object_stub(norad_id)?;
            outcome.created = true;
        }

        if let Some(cospar_id) = record.cospar_id.as_deref().filter(|id| !id.is_empty()) {
            for stale in session.objects_with_cospar(cospar_id, norad_id)? {
                tracing::warn!(
                    deleted = %stale,
                    kept = %norad_id,
                    cospar_id,
                    "Deleting object that shares its COSPAR designator"
                );
                metrics::counter!("catalog_collisions_total").increment(1);
                if session.delete_object(stale)? {
                    outcome.collisions += 1;
                }
            }
        }

        let object = TrackedObject {
            norad_id,
            cospar_id: record.cospar_id.clone().filter(|id| !id.is_empty()),
            launch_date: record.launch_date,
            decay_date: record.decay_date,
            status: resolve(session, ReferenceKind::Status, record.status.as_deref())?,
            owner: resolve(session, ReferenceKind::Owner, record.owner.as_deref())?,
            launch_site: resolve(session, ReferenceKind::LaunchSite, record.launch_site.as_deref())?,
            orbital_fate: resolve(session, ReferenceKind::OrbitalFate, record.orbital_fate.as_deref())?,
            orbital_parent: resolve(
                session,
                ReferenceKind::OrbitalParent,
                record.orbital_parent.as_deref(),
            )?,
            orbital_period: record.orbital_period,
            is_debris: false,
        };
        session.update_object(&object)?;

        session.delete_names(norad_id, NameSource::Satcat)?;
        self.normalizer
            .insert_name(session, norad_id, &record.name, NameSource::Satcat, true)?;

        Ok(outcome)
    }

    /// Replaces every annex name.
    ///
    /// All names from the annex source are deleted first. Entries for
    /// objects not in the catalog are skipped. Returns the number of names
    /// stored.
    ///
    /// # Errors
    ///
    /// Returns an error if a storage operation fails.
    pub fn apply_annex<S>(&self, session: &S, entries: &[AnnexEntry]) -> Result<u64>
    where
        S: CatalogSession + ?Sized,
    {
        let removed = session.delete_names_from_source(NameSource::Annex)?;
        tracing::debug!(removed, "Cleared annex names");

        let mut stored = 0_u64;
        for entry in entries {
            if !session.object_exists(entry.norad_id)? {
                tracing::debug!(norad_id = %entry.norad_id, "Annex entry for unknown object");
                continue;
            }
            for name in &entry.names {
                let components = self.normalizer.insert_name(
                    session,
                    entry.norad_id,
                    &name.name,
                    NameSource::Annex,
                    name.is_canonical,
                )?;
                stored += components as u64;
            }
        }

        tracing::info!(names = stored, "Annex names applied");
        Ok(stored)
    }
}

fn resolve<S>(session: &S, kind: ReferenceKind, abbrev: Option<&str>) -> Result<Option<i64>>
where
    S: CatalogSession + ?Sized,
{
    let Some(abbrev) = abbrev.map(str::trim).filter(|abbrev| !abbrev.is_empty()) else {
        return Ok(None);
    };
    let id = session.reference_id(kind, abbrev)?;
    if id.is_none() {
        tracing::debug!(%kind, abbrev, "Unknown reference code");
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feeds::AnnexName;
    use crate::models::{NoradId, ReferenceCode};
    use crate::storage::SqliteStore;

    fn record(norad: u32, cospar: &str, name: &str) -> CatalogRecord {
        CatalogRecord {
            norad_id: NoradId::new(norad),
            cospar_id: Some(cospar.to_string()).filter(|c| !c.is_empty()),
            name: name.to_string(),
            ..CatalogRecord::default()
        }
    }

    #[test]
    fn test_new_record_creates_object_with_references() {
        let mut store = SqliteStore::in_memory().unwrap();
        let session = store.begin().unwrap();
        let owner = session
            .upsert_reference(&ReferenceCode {
                kind: ReferenceKind::Owner,
                abbrev: "ISS".to_string(),
                name: "International Space Station".to_string(),
                adjective: None,
            })
            .unwrap();

        let mut iss = record(25_544, "1998-067A", "ISS (ZARYA)");
        iss.owner = Some("ISS".to_string());
        iss.status = Some("+".to_string());
        iss.orbital_period = Some(92.9);

        let outcome = CatalogReconciler::default()
            .reconcile_record(&session, &iss)
            .unwrap();
        assert!(outcome.created);

        let object = session.get_object(NoradId::new(25_544)).unwrap().unwrap();
        assert_eq!(object.owner, Some(owner));
        assert_eq!(object.status, None);
        assert_eq!(object.cospar_id.as_deref(), Some("1998-067A"));
        assert_eq!(session.names_for(NoradId::new(25_544)).unwrap().len(), 2);
    }

    #[test]
    fn test_collision_deletes_other_holder() {
        let mut store = SqliteStore::in_memory().unwrap();
        let session = store.begin().unwrap();
        let reconciler = CatalogReconciler::default();

        reconciler.reconcile_record(&session, &record(100, "X", "OLD")).unwrap();
        let outcome = reconciler.reconcile_record(&session, &record(200, "x", "NEW")).unwrap();

        assert_eq!(outcome.collisions, 1);
        assert!(!session.object_exists(NoradId::new(100)).unwrap());
        assert!(session.object_exists(NoradId::new(200)).unwrap());
    }

    #[test]
    fn test_blank_cospar_never_collides() {
        let mut store = SqliteStore::in_memory().unwrap();
        let session = store.begin().unwrap();
        let reconciler = CatalogReconciler::default();

        let summary = reconciler
            .reconcile(&session, &[record(1, "", "A"), record(2, "", "B")])
            .unwrap();
        assert_eq!(summary.collisions, 0);
        assert_eq!(summary.created, 2);
    }

    #[test]
    fn test_rerun_replaces_attributes_and_clears_debris() {
        let mut store = SqliteStore::in_memory().unwrap();
        let session = store.begin().unwrap();
        let reconciler = CatalogReconciler::default();

        reconciler
            .reconcile_record(&session, &record(33_000, "2008-001C", "THOR DEB"))
            .unwrap();
        assert!(session.get_object(NoradId::new(33_000)).unwrap().unwrap().is_debris);

        let mut renamed = record(33_000, "2008-001C", "THOR R/B");
        renamed.orbital_period = Some(101.0);
        let outcome = reconciler.reconcile_record(&session, &renamed).unwrap();
        assert!(!outcome.created);

        let object = session.get_object(NoradId::new(33_000)).unwrap().unwrap();
        assert!(!object.is_debris);
        assert_eq!(object.orbital_period, Some(101.0));
        let names = session.names_for(NoradId::new(33_000)).unwrap();
        assert_eq!(names.len(), 1);
        assert_eq!(names[0].name, "THOR R/B");
    }

    #[test]
    fn test_annex_replaces_names_and_skips_unknown_objects() {
        let mut store = SqliteStore::in_memory().unwrap();
        let session = store.begin().unwrap();
        let reconciler = CatalogReconciler::default();
        reconciler.reconcile_record(&session, &record(20_580, "1990-037B", "HST")).unwrap();

        let entries = vec![
            AnnexEntry {
                norad_id: NoradId::new(20_580),
                names: vec![
                    AnnexName {
                        name: "Hubble".to_string(),
                        is_canonical: true,
                    },
                    AnnexName {
                        name: "Hubble Space Telescope".to_string(),
                        is_canonical: false,
                    },
                ],
            },
            AnnexEntry {
                norad_id: NoradId::new(99_999),
                names: vec![AnnexName {
                    name: "Ghost".to_string(),
                    is_canonical: false,
                }],
            },
        ];

        assert_eq!(reconciler.apply_annex(&session, &entries).unwrap(), 2);
        assert_eq!(reconciler.apply_annex(&session, &entries).unwrap(), 2);

        let names = session.names_for(NoradId::new(20_580)).unwrap();
        assert_eq!(names.len(), 3);
        let canonical: Vec<&str> = names
            .iter()
            .filter(|n| n.is_canonical)
            .map(|n| n.name.as_str())
            .collect();
        assert_eq!(canonical, vec!["Hubble"]);
        assert!(!session.object_exists(NoradId::new(99_999)).unwrap());
    }
}
