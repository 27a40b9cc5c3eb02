//! Storage layer.
//!
//! Every component reads and writes the catalog through a [`CatalogSession`].
//! The `SQLite` implementation keeps the whole catalog and orbit history in
//! one database file, and each session is one transaction on it.

pub mod migrations;
pub mod sqlite;
mod traits;

pub use sqlite::{SqliteSession, SqliteStore};
pub use traits::CatalogSession;
