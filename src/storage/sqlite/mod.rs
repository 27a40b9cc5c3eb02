//! `SQLite` catalog backend.
//!
//! ## Module Structure
//!
//! - [`connection`]: pragma configuration applied to every connection
//! - [`schema`]: embedded schema migrations
//! - [`rows`]: row conversion for objects, orbits, epochs and memberships
//! - [`metrics`]: per-operation metrics and error mapping
//! - `store`: [`SqliteStore`] and its transactional [`SqliteSession`]

mod connection;
mod metrics;
mod rows;
mod schema;
mod store;

pub use connection::configure_connection;
pub use metrics::{instrumented, record_operation_metrics};
pub use schema::MIGRATIONS;
pub use store::{SqliteSession, SqliteStore};
