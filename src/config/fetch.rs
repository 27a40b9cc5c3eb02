//! Feed retrieval settings.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

const SECONDS_PER_HOUR: u64 = 3_600;
const SECONDS_PER_DAY: u64 = 86_400;

/// Where feeds come from and how long downloaded copies stay valid.
#[derive(Debug, Clone, Serialize)]
pub struct FetchSettings {
    /// Directory holding the last good copy of every feed.
    pub cache_dir: PathBuf,
    /// Base URL of the per-subgroup element files.
    pub element_base_url: String,
    /// Master catalog URL.
    pub satcat_url: String,
    /// Catalog annex URL.
    pub annex_url: String,
    /// `mcnames` magnitude table URL.
    pub mcnames_url: String,
    /// `qs.mag` magnitude table URL.
    pub qsmag_url: String,
    /// HTTP request timeout in seconds.
    pub timeout_secs: u64,
    /// Minimum line count for an element or catalog download to be accepted.
    pub min_lines: usize,
    /// Days a downloaded magnitude table is reused.
    pub magnitude_ttl_days: u64,
    /// Hours a downloaded catalog or annex is reused; 0 refetches every run.
    pub catalog_ttl_hours: u64,
    /// Hours a downloaded element file is reused; 0 refetches every run.
    pub element_ttl_hours: u64,
    /// Directory of bundled copies used when a feed has never been downloaded.
    pub fallback_dir: Option<PathBuf>,
    /// Authenticated bulk element feed.
    pub spacetrack: SpaceTrackSettings,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from(".satlog").join("cache"),
            element_base_url: "https://celestrak.org/NORAD/elements/".to_string(),
            satcat_url: "https://celestrak.org/pub/satcat.txt".to_string(),
            annex_url: "https://celestrak.org/pub/satcat-annex.txt".to_string(),
            mcnames_url: "https://www.prismnet.com/~mmccants/tles/mcnames".to_string(),
            qsmag_url: "https://www.prismnet.com/~mmccants/programs/qs.mag".to_string(),
            timeout_secs: 30,
            min_lines: 3,
            magnitude_ttl_days: 60,
            catalog_ttl_hours: 0,
            element_ttl_hours: 0,
            fallback_dir: None,
            spacetrack: SpaceTrackSettings::default(),
        }
    }
}

impl FetchSettings {
    /// Request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Time-to-live of magnitude tables.
    #[must_use]
    pub const fn magnitude_ttl(&self) -> Duration {
        Duration::from_secs(self.magnitude_ttl_days * SECONDS_PER_DAY)
    }

    /// Time-to-live of the catalog and its annex.
    #[must_use]
    pub const fn catalog_ttl(&self) -> Duration {
        Duration::from_secs(self.catalog_ttl_hours * SECONDS_PER_HOUR)
    }

    /// Time-to-live of element files.
    #[must_use]
    pub const fn element_ttl(&self) -> Duration {
        Duration::from_secs(self.element_ttl_hours * SECONDS_PER_HOUR)
    }

    /// Joins an element file name onto the element base URL.
    #[must_use]
    pub fn element_url(&self, file_name: &str) -> String {
        format!("{}/{file_name}", self.element_base_url.trim_end_matches('/'))
    }

    /// Path of the bundled copy of a feed, if a fallback directory is set.
    #[must_use]
    pub fn fallback_for(&self, name: &str) -> Option<PathBuf> {
        self.fallback_dir.as_ref().map(|dir| dir.join(name))
    }
}

/// Credentials and query for the authenticated bulk element feed.
#[derive(Debug, Clone, Serialize)]
pub struct SpaceTrackSettings {
    /// Whether the feed is fetched at all.
    pub enabled: bool,
    /// Login endpoint; the query result is returned by the login request.
    pub login_url: String,
    /// Query run after logging in.
    pub query: String,
    /// Account identity.
    pub identity: Option<String>,
    /// Account password.
    #[serde(serialize_with = "redact_secret")]
    pub password: Option<SecretString>,
    /// Days a downloaded copy is reused.
    pub ttl_days: u64,
}

impl Default for SpaceTrackSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            login_url: "https://www.space-track.org/ajaxauth/login".to_string(),
            query: "https://www.space-track.org/basicspacedata/query/class/tle_latest/ORDINAL/1/EPOCH/%3Enow-30/orderby/NORAD_CAT_ID/format/tle".to_string(),
            identity: None,
            password: None,
            ttl_days: 5,
        }
    }
}

impl SpaceTrackSettings {
    /// Time-to-live of the bulk download.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_days * SECONDS_PER_DAY)
    }

    /// Returns identity and password when the feed is enabled and both are set.
    #[must_use]
    pub fn credentials(&self) -> Option<(&str, &SecretString)> {
        if !self.enabled {
            return None;
        }
        self.identity.as_deref().zip(self.password.as_ref())
    }
}

/// Never serialize the actual secret.
#[allow(clippy::ref_option)]
fn redact_secret<S>(secret: &Option<SecretString>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match secret {
        Some(_) => serializer.serialize_str("***REDACTED***"),
        None => serializer.serialize_none(),
    }
}

/// `[fetch]` section in the config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileFetch {
    /// Cache directory.
    pub cache_dir: Option<String>,
    /// Element base URL.
    pub element_base_url: Option<String>,
    /// Catalog URL.
    pub satcat_url: Option<String>,
    /// Annex URL.
    pub annex_url: Option<String>,
    /// `mcnames` URL.
    pub mcnames_url: Option<String>,
    /// `qs.mag` URL.
    pub qsmag_url: Option<String>,
    /// Request timeout.
    pub timeout_secs: Option<u64>,
    /// Minimum accepted line count.
    pub min_lines: Option<usize>,
    /// Magnitude table TTL.
    pub magnitude_ttl_days: Option<u64>,
    /// Catalog TTL.
    pub catalog_ttl_hours: Option<u64>,
    /// Element file TTL.
    pub element_ttl_hours: Option<u64>,
    /// Bundled copies.
    pub fallback_dir: Option<String>,
    /// Authenticated bulk feed.
    pub spacetrack: Option<ConfigFileSpaceTrack>,
}

/// `[fetch.spacetrack]` section in the config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileSpaceTrack {
    /// Enabled flag.
    pub enabled: Option<bool>,
    /// Login endpoint.
    pub login_url: Option<String>,
    /// Query.
    pub query: Option<String>,
    /// Identity.
    pub identity: Option<String>,
    /// Password.
    pub password: Option<String>,
    /// TTL in days.
    pub ttl_days: Option<u64>,
}

impl FetchSettings {
    /// Overlays the values present in a config file section.
    pub(super) fn merge(&mut self, file: ConfigFileFetch) {
        if let Some(v) = file.cache_dir {
            self.cache_dir = PathBuf::from(v);
        }
        if let Some(v) = file.element_base_url {
            self.element_base_url = v;
        }
        if let Some(v) = file.satcat_url {
            self.satcat_url = v;
        }
        if let Some(v) = file.annex_url {
            self.annex_url = v;
        }
        if let Some(v) = file.mcnames_url {
            self.mcnames_url = v;
        }
        if let Some(v) = file.qsmag_url {
            self.qsmag_url = v;
        }
        if let Some(v) = file.timeout_secs {
            self.timeout_secs = v;
        }
        if let Some(v) = file.min_lines {
            self.min_lines = v;
        }
        if let Some(v) = file.magnitude_ttl_days {
            self.magnitude_ttl_days = v;
        }
        if let Some(v) = file.catalog_ttl_hours {
            self.catalog_ttl_hours = v;
        }
        if let Some(v) = file.element_ttl_hours {
            self.element_ttl_hours = v;
        }
        if let Some(v) = file.fallback_dir {
            self.fallback_dir = Some(PathBuf::from(v));
        }
        if let Some(spacetrack) = file.spacetrack {
            if let Some(v) = spacetrack.enabled {
                self.spacetrack.enabled = v;
            }
            if let Some(v) = spacetrack.login_url {
                self.spacetrack.login_url = v;
            }
            if let Some(v) = spacetrack.query {
                self.spacetrack.query = v;
            }
            if let Some(v) = spacetrack.identity {
                self.spacetrack.identity = Some(v);
            }
            if let Some(v) = spacetrack.password {
                self.spacetrack.password = Some(SecretString::from(v));
            }
            if let Some(v) = spacetrack.ttl_days {
                self.spacetrack.ttl_days = v;
            }
        }
    }
}
