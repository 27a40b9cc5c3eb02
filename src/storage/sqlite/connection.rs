//! Connection configuration for the `SQLite` store.

use crate::{Error, Result};
use rusqlite::Connection;

/// Configures a `SQLite` connection for the catalog store.
///
/// # Configuration Applied
///
/// - **WAL mode**: readers keep working while an ingestion run holds the write lock
/// - **NORMAL synchronous**: balances durability with performance
/// - **`busy_timeout`**: waits up to 5 seconds for a competing writer
/// - **`foreign_keys`**: enforced, so deleting an object cascades to its
///   names, orbits and memberships
///
/// # Errors
///
/// Returns [`Error::OperationFailed`] if foreign-key enforcement cannot be enabled.
pub fn configure_connection(conn: &Connection) -> Result<()> {
    // Setting journal_mode reports the mode actually in effect
    match conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0)) {
        Ok(mode) => tracing::debug!(journal_mode = %mode, "Configured journal mode"),
        Err(e) => tracing::warn!(error = %e, "Failed to set journal mode"),
    }
    let _ = conn.pragma_update(None, "synchronous", "NORMAL");
    let _ = conn.pragma_update(None, "busy_timeout", "5000");

    conn.pragma_update(None, "foreign_keys", "ON")
        .map_err(|e| Error::OperationFailed {
            operation: "enable_foreign_keys".to_string(),
            cause: e.to_string(),
        })
}
