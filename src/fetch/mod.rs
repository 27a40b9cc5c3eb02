//! Feed retrieval.
//!
//! A [`CachedFetcher`] keeps the last good copy of every feed on disk and
//! downloads through a [`Transport`]. Retrieval problems never abort a run
//! while any copy of the feed exists; they surface as
//! [`FetchOutcome::Stale`] and a warning.

mod cache;
mod transport;

pub use cache::{CachedFetcher, FetchOutcome, FetchSpec};
pub use transport::{FetchMethod, HttpTransport, Transport};
