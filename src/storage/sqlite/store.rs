//! `SQLite` catalog store and its transactional sessions.

use super::connection::configure_connection;
use super::metrics::instrumented;
use super::rows::{
    EPOCH_COLUMNS, MEMBERSHIP_COLUMNS, NAME_COLUMNS, OBJECT_COLUMNS, ORBIT_COLUMNS,
    epoch_from_row, membership_from_row, name_from_row, object_from_row, orbit_from_row,
};
use super::schema::MIGRATIONS;
use crate::models::{
    CaptureEpoch, EpochId, EpochMembership, EpochSummary, NameSource, NoradId, ObjectName,
    OrbitId, OrbitalState, ReferenceCode, ReferenceKind, Subgroup, SubgroupFeed, SubgroupId,
    TrackedObject,
};
use crate::storage::migrations::MigrationRunner;
use crate::storage::traits::CatalogSession;
use crate::{Error, Result};
use rusqlite::{Connection, OptionalExtension, Transaction, TransactionBehavior, params};
use std::path::{Path, PathBuf};

/// Catalog store backed by a single `SQLite` database file.
///
/// All reads and writes go through a [`SqliteSession`] obtained from
/// [`SqliteStore::begin`].
pub struct SqliteStore {
    conn: Connection,
    db_path: Option<PathBuf>,
}

impl SqliteStore {
    /// Opens (or creates) the store at `path` and brings its schema up to date.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| Error::OperationFailed {
                operation: "create_database_dir".to_string(),
                cause: format!("{}: {e}", parent.display()),
            })?;
        }

        let conn = Connection::open(path).map_err(|e| Error::OperationFailed {
            operation: "open_sqlite".to_string(),
            cause: e.to_string(),
        })?;
        Self::initialize(conn, Some(path.to_path_buf()))
    }

    /// Creates a store in memory, used by tests and dry runs.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be created.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| Error::OperationFailed {
            operation: "open_sqlite_memory".to_string(),
            cause: e.to_string(),
        })?;
        Self::initialize(conn, None)
    }

    fn initialize(mut conn: Connection, db_path: Option<PathBuf>) -> Result<Self> {
        configure_connection(&conn)?;
        let applied = MigrationRunner::new(&mut conn).run(MIGRATIONS)?;
        if applied > 0 {
            tracing::debug!(applied, "Catalog schema upgraded");
        }
        Ok(Self { conn, db_path })
    }

    /// Returns the database path, if not in-memory.
    #[must_use]
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Returns the applied schema version.
    ///
    /// # Errors
    ///
    /// Returns an error if the migrations table cannot be read.
    pub fn schema_version(&mut self) -> Result<i32> {
        MigrationRunner::new(&mut self.conn).current_version()
    }

    /// Opens a write transaction.
    ///
    /// The session rolls back when dropped unless [`SqliteSession::commit`]
    /// is called.
    ///
    /// # Errors
    ///
    /// Returns an error if the write lock cannot be taken.
    pub fn begin(&mut self) -> Result<SqliteSession<'_>> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| Error::OperationFailed {
                operation: "begin_transaction".to_string(),
                cause: e.to_string(),
            })?;
        Ok(SqliteSession { tx })
    }
}

/// One open transaction on a [`SqliteStore`].
pub struct SqliteSession<'conn> {
    tx: Transaction<'conn>,
}

impl SqliteSession<'_> {
    /// Makes everything done in this session visible.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit fails; the transaction is rolled back.
    pub fn commit(self) -> Result<()> {
        instrumented("commit", || self.tx.commit())
    }

    /// Discards everything done in this session.
    ///
    /// # Errors
    ///
    /// Returns an error if the rollback fails.
    pub fn rollback(self) -> Result<()> {
        instrumented("rollback", || self.tx.rollback())
    }
}

fn to_count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

impl CatalogSession for SqliteSession<'_> {
    fn upsert_reference(&self, code: &ReferenceCode) -> Result<i64> {
        instrumented("upsert_reference", || {
            self.tx.query_row(
                "INSERT INTO reference_codes (kind, abbrev, name, adjective)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT (kind, abbrev)
                 DO UPDATE SET name = excluded.name, adjective = excluded.adjective
                 RETURNING id",
                params![code.kind.as_str(), code.abbrev, code.name, code.adjective],
                |row| row.get(0),
            )
        })
    }

    fn reference_id(&self, kind: ReferenceKind, abbrev: &str) -> Result<Option<i64>> {
        instrumented("reference_id", || {
            self.tx
                .prepare_cached("SELECT id FROM reference_codes WHERE kind = ?1 AND abbrev = ?2")?
                .query_row(params![kind.as_str(), abbrev], |row| row.get(0))
                .optional()
        })
    }

    fn ensure_group(&self, name: &str) -> Result<i64> {
        instrumented("ensure_group", || {
            self.tx.query_row(
                "INSERT INTO sat_groups (name) VALUES (?1)
                 ON CONFLICT (name) DO UPDATE SET name = excluded.name
                 RETURNING id",
                params![name],
                |row| row.get(0),
            )
        })
    }

    fn upsert_subgroup(
        &self,
        group_id: i64,
        name: &str,
        feed: &SubgroupFeed,
    ) -> Result<SubgroupId> {
        let id = instrumented("upsert_subgroup", || {
            self.tx.query_row(
                "INSERT INTO subgroups (group_id, name, feed) VALUES (?1, ?2, ?3)
                 ON CONFLICT (group_id, name) DO UPDATE SET feed = excluded.feed
                 RETURNING id",
                params![group_id, name, feed.descriptor()],
                |row| row.get(0),
            )
        })?;
        Ok(SubgroupId::new(id))
    }

    fn list_subgroups(&self) -> Result<Vec<Subgroup>> {
        let rows: Vec<(i64, String, String, String)> = instrumented("list_subgroups", || {
            let mut stmt = self.tx.prepare(
                "SELECT s.id, g.name, s.name, s.feed
                 FROM subgroups s JOIN sat_groups g ON g.id = s.group_id
                 ORDER BY g.name, s.name",
            )?;
            stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)))?
                .collect()
        })?;

        rows.into_iter()
            .map(|(id, group, name, feed)| {
                Ok(Subgroup {
                    id: SubgroupId::new(id),
                    group,
                    name,
                    feed: SubgroupFeed::parse(&feed)?,
                })
            })
            .collect()
    }

    fn clear_group_members(&self) -> Result<u64> {
        let deleted = instrumented("clear_group_members", || {
            self.tx.execute("DELETE FROM group_members", [])
        })?;
        Ok(deleted as u64)
    }

    fn add_group_member(&self, norad_id: NoradId, subgroup: SubgroupId) -> Result<()> {
        instrumented("add_group_member", || {
            self.tx
                .prepare_cached(
                    "INSERT OR IGNORE INTO group_members (norad_id, subgroup_id) VALUES (?1, ?2)",
                )?
                .execute(params![norad_id.get(), subgroup.get()])
        })?;
        Ok(())
    }

    fn count_group_members(&self, subgroup: SubgroupId) -> Result<u64> {
        let count: i64 = instrumented("count_group_members", || {
            self.tx.query_row(
                "SELECT COUNT(*) FROM group_members WHERE subgroup_id = ?1",
                params![subgroup.get()],
                |row| row.get(0),
            )
        })?;
        Ok(to_count(count))
    }

    fn object_exists(&self, norad_id: NoradId) -> Result<bool> {
        instrumented("object_exists", || {
            self.tx
                .prepare_cached("SELECT EXISTS (SELECT 1 FROM objects WHERE norad_id = ?1)")?
                .query_row(params![norad_id.get()], |row| row.get(0))
        })
    }

    fn get_object(&self, norad_id: NoradId) -> Result<Option<TrackedObject>> {
        instrumented("get_object", || {
            self.tx
                .query_row(
                    &format!("SELECT {OBJECT_COLUMNS} FROM objects WHERE norad_id = ?1"),
                    params![norad_id.get()],
                    object_from_row,
                )
                .optional()
        })
    }

    fn insert_object_stub(&self, norad_id: NoradId) -> Result<()> {
        instrumented("insert_object_stub", || {
            self.tx
                .prepare_cached("INSERT OR IGNORE INTO objects (norad_id) VALUES (?1)")?
                .execute(params![norad_id.get()])
        })?;
        Ok(())
    }

    fn objects_with_cospar(&self, cospar_id: &str, excluding: NoradId) -> Result<Vec<NoradId>> {
        instrumented("objects_with_cospar", || {
            let mut stmt = self.tx.prepare_cached(
                "SELECT norad_id FROM objects
                 WHERE cospar_id = ?1 AND norad_id != ?2
                 ORDER BY norad_id",
            )?;
            stmt.query_map(params![cospar_id, excluding.get()], |row| {
                Ok(NoradId::new(row.get(0)?))
            })?
            .collect()
        })
    }

    fn delete_object(&self, norad_id: NoradId) -> Result<bool> {
        let deleted = instrumented("delete_object", || {
            self.tx
                .execute("DELETE FROM objects WHERE norad_id = ?1", params![norad_id.get()])
        })?;
        Ok(deleted > 0)
    }

    fn update_object(&self, object: &TrackedObject) -> Result<()> {
        let updated = instrumented("update_object", || {
            self.tx
                .prepare_cached(
                    "UPDATE objects SET
                        cospar_id = ?2, launch_date = ?3, decay_date = ?4,
                        status_id = ?5, owner_id = ?6, launch_site_id = ?7,
                        orbital_fate_id = ?8, orbital_parent_id = ?9,
                        orbital_period = ?10, is_debris = ?11
                     WHERE norad_id = ?1",
                )?
                .execute(params![
                    object.norad_id.get(),
                    object.cospar_id,
                    object.launch_date,
                    object.decay_date,
                    object.status,
                    object.owner,
                    object.launch_site,
                    object.orbital_fate,
                    object.orbital_parent,
                    object.orbital_period,
                    object.is_debris,
                ])
        })?;

        if updated == 0 {
            return Err(Error::InvalidInput(format!(
                "object {} is not in the catalog",
                object.norad_id
            )));
        }
        Ok(())
    }

    fn set_debris(&self, norad_id: NoradId) -> Result<()> {
        instrumented("set_debris", || {
            self.tx.execute(
                "UPDATE objects SET is_debris = 1 WHERE norad_id = ?1",
                params![norad_id.get()],
            )
        })?;
        Ok(())
    }

    fn delete_names(&self, norad_id: NoradId, source: NameSource) -> Result<u64> {
        let deleted = instrumented("delete_names", || {
            self.tx
                .prepare_cached("DELETE FROM object_names WHERE norad_id = ?1 AND source = ?2")?
                .execute(params![norad_id.get(), source.code()])
        })?;
        Ok(deleted as u64)
    }

    fn delete_names_from_source(&self, source: NameSource) -> Result<u64> {
        let deleted = instrumented("delete_names_from_source", || {
            self.tx
                .execute("DELETE FROM object_names WHERE source = ?1", params![source.code()])
        })?;
        Ok(deleted as u64)
    }

    fn demote_canonical_names(&self, norad_id: NoradId) -> Result<u64> {
        let demoted = instrumented("demote_canonical_names", || {
            self.tx
                .prepare_cached(
                    "UPDATE object_names SET is_canonical = 0
                     WHERE norad_id = ?1 AND is_canonical = 1",
                )?
                .execute(params![norad_id.get()])
        })?;
        Ok(demoted as u64)
    }

    fn upsert_name(&self, name: &ObjectName) -> Result<()> {
        instrumented("upsert_name", || {
            self.tx
                .prepare_cached(
                    "INSERT INTO object_names (norad_id, name, source, is_canonical)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT (norad_id, name, source)
                     DO UPDATE SET is_canonical = is_canonical OR excluded.is_canonical",
                )?
                .execute(params![
                    name.norad_id.get(),
                    name.name,
                    name.source.code(),
                    name.is_canonical
                ])
        })?;
        Ok(())
    }

    fn names_for(&self, norad_id: NoradId) -> Result<Vec<ObjectName>> {
        instrumented("names_for", || {
            let mut stmt = self.tx.prepare_cached(&format!(
                "SELECT {NAME_COLUMNS} FROM object_names
                 WHERE norad_id = ?1
                 ORDER BY source, is_canonical DESC, name"
            ))?;
            stmt.query_map(params![norad_id.get()], name_from_row)?
                .collect()
        })
    }

    fn insert_epoch(&self, timestamp: f64, run_id: &str) -> Result<CaptureEpoch> {
        let id = instrumented("insert_epoch", || {
            self.tx.execute(
                "INSERT INTO capture_epochs (run_id, timestamp) VALUES (?1, ?2)",
                params![run_id, timestamp],
            )?;
            Ok(self.tx.last_insert_rowid())
        })?;
        Ok(CaptureEpoch {
            id: EpochId::new(id),
            timestamp,
            run_id: run_id.to_string(),
        })
    }

    fn previous_epoch(&self, epoch: &CaptureEpoch) -> Result<Option<CaptureEpoch>> {
        instrumented("previous_epoch", || {
            self.tx
                .query_row(
                    &format!(
                        "SELECT {EPOCH_COLUMNS} FROM capture_epochs
                         WHERE timestamp < ?1 OR (timestamp = ?1 AND id < ?2)
                         ORDER BY timestamp DESC, id DESC
                         LIMIT 1"
                    ),
                    params![epoch.timestamp, epoch.id.get()],
                    epoch_from_row,
                )
                .optional()
        })
    }

    fn recent_epochs(&self, limit: usize) -> Result<Vec<EpochSummary>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        instrumented("recent_epochs", || {
            let mut stmt = self.tx.prepare(
                "SELECT e.id, e.timestamp, e.run_id,
                        COALESCE(SUM(m.kind = 'measured'), 0),
                        COALESCE(SUM(m.kind = 'unchanged'), 0),
                        COALESCE(SUM(m.kind = 'carried'), 0)
                 FROM capture_epochs e
                 LEFT JOIN epoch_memberships m ON m.epoch_id = e.id
                 GROUP BY e.id
                 ORDER BY e.timestamp DESC, e.id DESC
                 LIMIT ?1",
            )?;
            stmt.query_map(params![limit], |row| {
                Ok(EpochSummary {
                    epoch: epoch_from_row(row)?,
                    measured: to_count(row.get(3)?),
                    unchanged: to_count(row.get(4)?),
                    carried: to_count(row.get(5)?),
                })
            })?
            .collect()
        })
    }

    fn find_orbit_near(
        &self,
        norad_id: NoradId,
        epoch: f64,
        tolerance: f64,
    ) -> Result<Option<OrbitId>> {
        instrumented("find_orbit_near", || {
            self.tx
                .prepare_cached(
                    "SELECT id FROM orbits
                     WHERE norad_id = ?1 AND epoch BETWEEN ?2 - ?3 AND ?2 + ?3
                     ORDER BY ABS(epoch - ?2), id
                     LIMIT 1",
                )?
                .query_row(params![norad_id.get(), epoch, tolerance], |row| {
                    Ok(OrbitId::new(row.get(0)?))
                })
                .optional()
        })
    }

    fn insert_orbit(&self, state: &OrbitalState) -> Result<OrbitId> {
        let id = instrumented("insert_orbit", || {
            self.tx
                .prepare_cached(&format!(
                    "INSERT INTO orbits ({ORBIT_COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)"
                ))?
                .execute(params![
                    state.norad_id.get(),
                    state.epoch,
                    state.inclination,
                    state.eccentricity,
                    state.raan,
                    state.arg_periapsis,
                    state.mean_anomaly,
                    state.mean_motion,
                    state.mean_motion_dot,
                    state.mean_motion_ddot,
                    state.bstar,
                    state.magnitude,
                    state.source.code(),
                    state.rev_count,
                ])?;
            Ok(self.tx.last_insert_rowid())
        })?;
        Ok(OrbitId::new(id))
    }

    fn get_orbit(&self, orbit_id: OrbitId) -> Result<Option<OrbitalState>> {
        instrumented("get_orbit", || {
            self.tx
                .query_row(
                    &format!("SELECT {ORBIT_COLUMNS} FROM orbits WHERE id = ?1"),
                    params![orbit_id.get()],
                    orbit_from_row,
                )
                .optional()
        })
    }

    fn get_membership(
        &self,
        norad_id: NoradId,
        epoch_id: EpochId,
    ) -> Result<Option<EpochMembership>> {
        instrumented("get_membership", || {
            self.tx
                .prepare_cached(&format!(
                    "SELECT {MEMBERSHIP_COLUMNS} FROM epoch_memberships
                     WHERE norad_id = ?1 AND epoch_id = ?2"
                ))?
                .query_row(params![norad_id.get(), epoch_id.get()], membership_from_row)
                .optional()
        })
    }

    fn insert_membership(&self, membership: &EpochMembership) -> Result<()> {
        instrumented("insert_membership", || {
            self.tx
                .prepare_cached(&format!(
                    "INSERT INTO epoch_memberships ({MEMBERSHIP_COLUMNS}) VALUES (?1, ?2, ?3, ?4)"
                ))?
                .execute(params![
                    membership.norad_id.get(),
                    membership.epoch_id.get(),
                    membership.orbit_id.get(),
                    membership.kind.as_str(),
                ])
        })?;
        Ok(())
    }

    fn delete_duplicate_memberships(&self, epoch_id: EpochId) -> Result<u64> {
        let deleted = instrumented("delete_duplicate_memberships", || {
            self.tx.execute(
                "DELETE FROM epoch_memberships
                 WHERE epoch_id = ?1 AND kind IN ('unchanged', 'carried')",
                params![epoch_id.get()],
            )
        })?;
        Ok(deleted as u64)
    }

    fn memberships_missing_from(
        &self,
        previous: EpochId,
        current: EpochId,
    ) -> Result<Vec<EpochMembership>> {
        instrumented("memberships_missing_from", || {
            let mut stmt = self.tx.prepare(
                "SELECT p.norad_id, p.epoch_id, p.orbit_id, p.kind
                 FROM epoch_memberships p
                 WHERE p.epoch_id = ?1
                   AND NOT EXISTS (
                       SELECT 1 FROM epoch_memberships c
                       WHERE c.epoch_id = ?2 AND c.norad_id = p.norad_id
                   )
                 ORDER BY p.norad_id",
            )?;
            stmt.query_map(params![previous.get(), current.get()], membership_from_row)?
                .collect()
        })
    }

    fn genuine_origin(&self, orbit_id: OrbitId) -> Result<Option<f64>> {
        instrumented("genuine_origin", || {
            self.tx
                .prepare_cached(
                    "SELECT MIN(e.timestamp)
                     FROM epoch_memberships m JOIN capture_epochs e ON e.id = m.epoch_id
                     WHERE m.orbit_id = ?1 AND m.kind = 'measured'",
                )?
                .query_row(params![orbit_id.get()], |row| row.get(0))
        })
    }

    fn memberships_for_epoch(&self, epoch_id: EpochId) -> Result<Vec<EpochMembership>> {
        instrumented("memberships_for_epoch", || {
            let mut stmt = self.tx.prepare(&format!(
                "SELECT {MEMBERSHIP_COLUMNS} FROM epoch_memberships
                 WHERE epoch_id = ?1
                 ORDER BY norad_id"
            ))?;
            stmt.query_map(params![epoch_id.get()], membership_from_row)?
                .collect()
        })
    }
}
