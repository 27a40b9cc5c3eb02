//! Configuration management.
//!
//! Configuration is read from a TOML file and overlaid on built-in
//! defaults. A handful of environment variables override the file:
//!
//! | Variable | Overrides |
//! |----------|-----------|
//! | `SATLOG_CONFIG_PATH` | Config file location |
//! | `SATLOG_DB_PATH` | `storage.path` |
//! | `SATLOG_SPACETRACK_IDENTITY` | `fetch.spacetrack.identity` |
//! | `SATLOG_SPACETRACK_PASSWORD` | `fetch.spacetrack.password` |
//!
//! Logging and metrics variables are read by [`crate::observability`].

mod fetch;
mod ingest;

pub use fetch::{ConfigFileFetch, ConfigFileSpaceTrack, FetchSettings, SpaceTrackSettings};
pub use ingest::{ConfigFileIngest, IngestSettings};

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration for satlog.
#[derive(Debug, Clone, Serialize)]
pub struct SatlogConfig {
    /// Path to the data directory.
    pub data_dir: PathBuf,
    /// Catalog database location.
    pub storage: StorageSettings,
    /// Feed retrieval.
    pub fetch: FetchSettings,
    /// Locally maintained catalog documents.
    pub catalog: CatalogSettings,
    /// Reconciliation and history merge tuning.
    pub ingest: IngestSettings,
    /// Logging and metrics.
    pub observability: ObservabilitySettings,
}

/// Catalog database settings.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StorageSettings {
    /// Database file; defaults to `satlog.db` in the data directory.
    pub path: Option<PathBuf>,
}

/// Locally maintained catalog documents.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogSettings {
    /// XML document with reference codes and the group/subgroup list.
    pub abbreviations_path: PathBuf,
    /// Extra `NORAD|name|...` lines merged in before the downloaded annex.
    pub extra_names_path: Option<PathBuf>,
}

impl CatalogSettings {
    fn in_data_dir(data_dir: &Path) -> Self {
        Self {
            abbreviations_path: data_dir.join("satcat_abbrevs.xml"),
            extra_names_path: None,
        }
    }
}

/// Observability settings as written in the config file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ObservabilitySettings {
    /// Logging.
    pub logging: Option<LoggingSettings>,
    /// Metrics.
    pub metrics: Option<MetricsSettings>,
}

/// `[observability.logging]` section.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LoggingSettings {
    /// `pretty` or `json`.
    pub format: Option<String>,
    /// `EnvFilter` directive, e.g. `satlog=debug`.
    pub filter: Option<String>,
    /// Append log lines to this file instead of stderr.
    pub file: Option<String>,
}

/// `[observability.metrics]` section.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MetricsSettings {
    /// Whether metrics are recorded.
    pub enabled: Option<bool>,
    /// Prometheus push gateway endpoint, pushed to at exit.
    pub push_gateway: Option<String>,
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    /// Data directory.
    pub data_dir: Option<String>,
    /// Storage section.
    pub storage: Option<ConfigFileStorage>,
    /// Fetch section.
    pub fetch: Option<ConfigFileFetch>,
    /// Catalog section.
    pub catalog: Option<ConfigFileCatalog>,
    /// Ingest section.
    pub ingest: Option<ConfigFileIngest>,
    /// Observability section.
    pub observability: Option<ObservabilitySettings>,
}

/// `[storage]` section in the config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileStorage {
    /// Database file.
    pub path: Option<String>,
}

/// `[catalog]` section in the config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileCatalog {
    /// Abbreviation document.
    pub abbreviations_path: Option<String>,
    /// Extra names file.
    pub extra_names_path: Option<String>,
}

impl Default for SatlogConfig {
    fn default() -> Self {
        let data_dir = PathBuf::from(".satlog");
        Self {
            storage: StorageSettings::default(),
            fetch: FetchSettings::default(),
            catalog: CatalogSettings::in_data_dir(&data_dir),
            ingest: IngestSettings::default(),
            observability: ObservabilitySettings::default(),
            data_dir,
        }
    }
}

impl SatlogConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration, then applies environment overrides.
    ///
    /// An explicit path must exist and parse. Without one, the file named by
    /// `SATLOG_CONFIG_PATH` is used, else the default locations.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly named file cannot be read or parsed.
    pub fn load(explicit: Option<&Path>) -> crate::Result<Self> {
        let env_path = std::env::var("SATLOG_CONFIG_PATH")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        let mut config = match explicit.map(Path::to_path_buf).or(env_path) {
            Some(path) => Self::load_from_file(&path)?,
            None => Self::load_default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> crate::Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| crate::Error::OperationFailed {
                operation: "read_config_file".to_string(),
                cause: format!("{}: {e}", path.display()),
            })?;

        Self::from_toml(&contents)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML or holds unusable values.
    pub fn from_toml(contents: &str) -> crate::Result<Self> {
        let file: ConfigFile =
            toml::from_str(contents).map_err(|e| crate::Error::OperationFailed {
                operation: "parse_config_file".to_string(),
                cause: e.to_string(),
            })?;

        Self::from_config_file(file)
    }

    /// Loads configuration from the default location.
    ///
    /// Checks the following paths in order:
    /// 1. Platform-specific config dir (`~/Library/Application Support/satlog/` on macOS)
    /// 2. XDG config dir (`~/.config/satlog/` for Unix compatibility)
    ///
    /// Returns default configuration if no config file is found.
    #[must_use]
    pub fn load_default() -> Self {
        let Some(base_dirs) = directories::BaseDirs::new() else {
            return Self::default();
        };

        let platform_config = base_dirs.config_dir().join("satlog").join("config.toml");
        let xdg_config = base_dirs
            .home_dir()
            .join(".config")
            .join("satlog")
            .join("config.toml");

        for candidate in [platform_config, xdg_config] {
            if !candidate.exists() {
                continue;
            }
            match Self::load_from_file(&candidate) {
                Ok(config) => return config,
                Err(err) => {
                    tracing::warn!(path = %candidate.display(), error = %err, "Ignoring unreadable config file");
                },
            }
        }

        Self::default()
    }

    /// Converts a `ConfigFile` to `SatlogConfig`.
    fn from_config_file(file: ConfigFile) -> crate::Result<Self> {
        let mut config = Self::default();

        if let Some(data_dir) = file.data_dir {
            config = config.with_data_dir(data_dir);
        }
        if let Some(storage) = file.storage {
            config.storage.path = storage.path.map(PathBuf::from);
        }
        if let Some(fetch) = file.fetch {
            config.fetch.merge(fetch);
        }
        if let Some(catalog) = file.catalog {
            if let Some(path) = catalog.abbreviations_path {
                config.catalog.abbreviations_path = PathBuf::from(path);
            }
            config.catalog.extra_names_path = catalog.extra_names_path.map(PathBuf::from);
        }
        if let Some(ingest) = file.ingest {
            config.ingest.merge(ingest)?;
        }
        if let Some(observability) = file.observability {
            config.observability = observability;
        }

        Ok(config)
    }

    /// Applies environment overrides through `lookup`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(path) = lookup("SATLOG_DB_PATH") {
            self.storage.path = Some(PathBuf::from(path));
        }
        if let Some(identity) = lookup("SATLOG_SPACETRACK_IDENTITY") {
            self.fetch.spacetrack.identity = Some(identity);
        }
        if let Some(password) = lookup("SATLOG_SPACETRACK_PASSWORD") {
            self.fetch.spacetrack.password = Some(SecretString::from(password));
        }
    }

    /// Sets the data directory, moving the paths derived from it along.
    #[must_use]
    pub fn with_data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_dir = path.into();
        self.fetch.cache_dir = self.data_dir.join("cache");
        self.catalog.abbreviations_path = self.data_dir.join("satcat_abbrevs.xml");
        self
    }

    /// Returns the catalog database path.
    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.storage
            .path
            .clone()
            .unwrap_or_else(|| self.data_dir.join("satlog.db"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = SatlogConfig::new();
        assert_eq!(config.db_path(), PathBuf::from(".satlog").join("satlog.db"));
        assert_eq!(config.fetch.cache_dir, PathBuf::from(".satlog").join("cache"));
        assert!(!config.fetch.spacetrack.enabled);
    }

    #[test]
    fn test_from_toml_overlays_defaults() {
        let config = SatlogConfig::from_toml(
            r#"
            data_dir = "/var/lib/satlog"

            [fetch]
            timeout_secs = 10
            element_base_url = "https://mirror.example.org/elements"

            [fetch.spacetrack]
            enabled = true
            identity = "observer@example.org"
            password = "hunter2"

            [ingest]
            epoch_tolerance_secs = 2.5
            magnitude_overrides = { Starlink = 5.0 }

            [observability.logging]
            format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.db_path(), PathBuf::from("/var/lib/satlog/satlog.db"));
        assert_eq!(config.fetch.cache_dir, PathBuf::from("/var/lib/satlog/cache"));
        assert_eq!(config.fetch.timeout_secs, 10);
        assert_eq!(config.fetch.min_lines, 3);
        assert_eq!(
            config.fetch.element_url("starlink.txt"),
            "https://mirror.example.org/elements/starlink.txt"
        );
        assert!(config.fetch.spacetrack.credentials().is_some());
        assert!((config.ingest.epoch_tolerance_secs - 2.5).abs() < f64::EPSILON);
        assert_eq!(config.ingest.magnitude_overrides.get("Starlink"), Some(&5.0));
        assert_eq!(
            config
                .observability
                .logging
                .and_then(|logging| logging.format)
                .as_deref(),
            Some("json")
        );
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        assert!(SatlogConfig::from_toml("data_dir = [").is_err());
        assert!(SatlogConfig::from_toml("[ingest]\nmax_gap_fill_age_days = -3.0").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[storage]\npath = \"catalog.db\"\n").unwrap();

        let config = SatlogConfig::load_from_file(&path).unwrap();
        assert_eq!(config.db_path(), PathBuf::from("catalog.db"));
        assert!(SatlogConfig::load_from_file(&dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("SATLOG_DB_PATH", "/tmp/override.db"),
            ("SATLOG_SPACETRACK_IDENTITY", "someone@example.org"),
            ("SATLOG_SPACETRACK_PASSWORD", "s3cret"),
            ("SATLOG_LOG", "   "),
        ]);
        let mut config = SatlogConfig::default();
        config.apply_env_overrides(|key| env.get(key).map(ToString::to_string));

        assert_eq!(config.db_path(), PathBuf::from("/tmp/override.db"));
        assert_eq!(
            config.fetch.spacetrack.identity.as_deref(),
            Some("someone@example.org")
        );
        assert_eq!(
            config
                .fetch
                .spacetrack
                .password
                .as_ref()
                .map(|p| p.expose_secret().to_string()),
            Some("s3cret".to_string())
        );
    }
}
