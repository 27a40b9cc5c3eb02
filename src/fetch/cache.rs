//! TTL file cache in front of a [`Transport`].
//!
//! Every feed is kept as a file in the cache directory. A copy younger than
//! the feed's TTL is reused without touching the network. Otherwise the feed
//! is downloaded and, if it looks complete, atomically replaces the cached
//! copy. A failed or truncated download leaves the previous copy in place
//! and the run continues with it.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use super::transport::{FetchMethod, Transport};
use crate::{Error, Result};

/// What to fetch and how long a copy stays valid.
#[derive(Debug, Clone)]
pub struct FetchSpec {
    /// File name of the copy in the cache directory.
    pub name: String,
    /// Feed URL.
    pub url: String,
    /// How the feed is requested.
    pub method: FetchMethod,
    /// How long a downloaded copy is reused; zero refetches on every run.
    pub ttl: Duration,
    /// Minimum number of lines for a download to be accepted.
    pub min_lines: usize,
    /// Bundled copy used when no download has ever succeeded.
    pub fallback: Option<PathBuf>,
}

impl FetchSpec {
    /// Creates a spec for a plain GET, refetched on every run.
    #[must_use]
    pub fn get(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            method: FetchMethod::Get,
            ttl: Duration::ZERO,
            min_lines: 1,
            fallback: None,
        }
    }

    /// Sets the time-to-live of downloaded copies.
    #[must_use]
    pub const fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Sets the minimum accepted line count.
    #[must_use]
    pub const fn with_min_lines(mut self, min_lines: usize) -> Self {
        self.min_lines = min_lines;
        self
    }

    /// Sets the bundled fallback copy.
    #[must_use]
    pub fn with_fallback(mut self, fallback: Option<PathBuf>) -> Self {
        self.fallback = fallback;
        self
    }

    /// Sets the request method.
    #[must_use]
    pub fn with_method(mut self, method: FetchMethod) -> Self {
        self.method = method;
        self
    }
}

/// Where the returned copy came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Downloaded during this call.
    Fresh(PathBuf),
    /// Reused because it was younger than the TTL.
    Cached(PathBuf),
    /// Download failed; an older copy (or the bundled fallback) is returned.
    Stale(PathBuf),
}

impl FetchOutcome {
    /// Path of the copy to read.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Fresh(path) | Self::Cached(path) | Self::Stale(path) => path,
        }
    }

    /// Returns the outcome as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Fresh(_) => "fresh",
            Self::Cached(_) => "cached",
            Self::Stale(_) => "stale",
        }
    }

    /// Reads the copy.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn read_to_string(&self) -> Result<String> {
        fs::read_to_string(self.path()).map_err(|e| Error::OperationFailed {
            operation: "read_cached_feed".to_string(),
            cause: format!("{}: {e}", self.path().display()),
        })
    }
}

/// File cache that downloads feeds through a [`Transport`].
pub struct CachedFetcher<T: Transport> {
    transport: T,
    cache_dir: PathBuf,
}

impl<T: Transport> CachedFetcher<T> {
    /// Creates a fetcher storing copies in `cache_dir`.
    #[must_use]
    pub fn new(transport: T, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            transport,
            cache_dir: cache_dir.into(),
        }
    }

    /// Returns the cache directory.
    #[must_use]
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Returns the transport.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Returns a usable copy of a feed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Fetch`] if the download fails and neither a previous
    /// copy nor a fallback exists, or an I/O error if the cache cannot be written.
    pub fn fetch(&self, spec: &FetchSpec) -> Result<FetchOutcome> {
        let path = self.cache_dir.join(&spec.name);
        let outcome = self.fetch_into(spec, path)?;
        metrics::counter!("fetch_outcomes_total", "outcome" => outcome.as_str()).increment(1);
        tracing::debug!(feed = %spec.name, outcome = outcome.as_str(), "Feed ready");
        Ok(outcome)
    }

    fn fetch_into(&self, spec: &FetchSpec, path: PathBuf) -> Result<FetchOutcome> {
        if is_fresh(&path, spec.ttl) {
            return Ok(FetchOutcome::Cached(path));
        }

        tracing::info!(feed = %spec.name, url = %spec.url, "Downloading feed");
        let failure = match self.transport.fetch(&spec.url, &spec.method) {
            Ok(body) => {
                let lines = body.lines().count();
                if lines >= spec.min_lines {
                    self.store(&path, &body)?;
                    return Ok(FetchOutcome::Fresh(path));
                }
                format!("only {lines} lines, expected at least {}", spec.min_lines)
            },
            Err(err) => err.to_string(),
        };

        if path.exists() {
            tracing::warn!(feed = %spec.name, cause = %failure, "Download failed, reusing previous copy");
            return Ok(FetchOutcome::Stale(path));
        }

        if let Some(fallback) = spec.fallback.as_ref().filter(|fallback| fallback.exists()) {
            tracing::warn!(
                feed = %spec.name,
                cause = %failure,
                fallback = %fallback.display(),
                "Download failed, using bundled copy"
            );
            self.ensure_cache_dir()?;
            fs::copy(fallback, &path).map_err(|e| Error::OperationFailed {
                operation: "copy_fallback_feed".to_string(),
                cause: format!("{}: {e}", fallback.display()),
            })?;
            return Ok(FetchOutcome::Stale(path));
        }

        Err(Error::Fetch {
            url: spec.url.clone(),
            cause: failure,
        })
    }

    fn ensure_cache_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.cache_dir).map_err(|e| Error::OperationFailed {
            operation: "create_cache_dir".to_string(),
            cause: format!("{}: {e}", self.cache_dir.display()),
        })
    }

    /// Writes next to the target and renames, so readers never see a partial file.
    fn store(&self, path: &Path, body: &str) -> Result<()> {
        self.ensure_cache_dir()?;
        let partial = path.with_extension("partial");
        fs::write(&partial, body)
            .and_then(|()| fs::rename(&partial, path))
            .map_err(|e| Error::OperationFailed {
                operation: "store_feed".to_string(),
                cause: format!("{}: {e}", path.display()),
            })
    }
}

fn is_fresh(path: &Path, ttl: Duration) -> bool {
    if ttl.is_zero() {
        return false;
    }
    fs::metadata(path)
        .and_then(|meta| meta.modified())
        .ok()
        .and_then(|modified| SystemTime::now().duration_since(modified).ok())
        .is_some_and(|age| age < ttl)
}
