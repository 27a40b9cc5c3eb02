//! `SQLite` migration system for schema management.
//!
//! Migrations are embedded at compile time and applied in version order when
//! a store is opened. Each migration runs in its own transaction together
//! with the row that records it, so a failed upgrade leaves the previous
//! schema intact.
//!
//! # Usage
//!
//! ```rust,ignore
//! use satlog::storage::migrations::{Migration, MigrationRunner};
//!
//! const MIGRATIONS: &[Migration] = &[Migration {
//!     version: 1,
//!     description: "Initial table",
//!     sql: "CREATE TABLE IF NOT EXISTS example (id INTEGER PRIMARY KEY);",
//! }];
//!
//! MigrationRunner::new(&mut conn).run(MIGRATIONS)?;
//! ```

use crate::{Error, Result};
use rusqlite::{Connection, params};

/// A single migration with version and SQL.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    /// Migration version (sequential, starting at 1).
    pub version: i32,
    /// Human-readable description.
    pub description: &'static str,
    /// SQL to apply (may contain multiple statements).
    pub sql: &'static str,
}

/// Applies pending migrations to a connection.
pub struct MigrationRunner<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> MigrationRunner<'conn> {
    /// Creates a new migration runner.
    #[must_use]
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }

    /// Runs all pending migrations.
    ///
    /// # Returns
    ///
    /// Number of migrations applied.
    ///
    /// # Errors
    ///
    /// Returns an error if a migration fails.
    pub fn run(&mut self, migrations: &[Migration]) -> Result<usize> {
        self.ensure_migrations_table()?;
        let current_version = self.current_version()?;

        let mut applied = 0;
        for migration in migrations {
            if migration.version > current_version {
                self.apply_migration(migration)?;
                applied += 1;
            }
        }
        Ok(applied)
    }

    /// Returns the current schema version (0 for an empty database).
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be queried.
    pub fn current_version(&self) -> Result<i32> {
        self.conn
            .query_row(
                "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
                [],
                |row| row.get(0),
            )
            .or_else(|e| match e {
                rusqlite::Error::SqliteFailure(_, Some(ref msg)) if msg.contains("no such table") => {
                    Ok(0)
                },
                other => Err(Error::OperationFailed {
                    operation: "migration_current_version".to_string(),
                    cause: other.to_string(),
                }),
            })
    }

    fn ensure_migrations_table(&self) -> Result<()> {
        self.conn
            .execute_batch(
                r"
                CREATE TABLE IF NOT EXISTS schema_migrations (
                    version INTEGER PRIMARY KEY,
                    description TEXT NOT NULL,
                    applied_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
                )
                ",
            )
            .map_err(|e| Error::OperationFailed {
                operation: "create_migrations_table".to_string(),
                cause: e.to_string(),
            })
    }

    fn apply_migration(&mut self, migration: &Migration) -> Result<()> {
        let tx = self.conn.transaction().map_err(|e| Error::OperationFailed {
            operation: format!("migration_v{}_begin_tx", migration.version),
            cause: e.to_string(),
        })?;

        tx.execute_batch(migration.sql)
            .map_err(|e| Error::OperationFailed {
                operation: format!("migration_v{}: {}", migration.version, migration.description),
                cause: e.to_string(),
            })?;

        tx.execute(
            "INSERT INTO schema_migrations (version, description) VALUES (?1, ?2)",
            params![migration.version, migration.description],
        )
        .map_err(|e| Error::OperationFailed {
            operation: "record_migration".to_string(),
            cause: e.to_string(),
        })?;

        tx.commit().map_err(|e| Error::OperationFailed {
            operation: format!("migration_v{}_commit", migration.version),
            cause: e.to_string(),
        })?;

        tracing::info!(
            version = migration.version,
            description = migration.description,
            "Applied migration"
        );
        Ok(())
    }
}

/// Maximum version across a set of migrations.
#[must_use]
pub const fn max_version(migrations: &[Migration]) -> i32 {
    let mut max = 0;
    let mut i = 0;
    while i < migrations.len() {
        if migrations[i].version > max {
            max = migrations[i].version;
        }
        i += 1;
    }
    max
}
