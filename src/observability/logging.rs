//! Structured logging configuration.

use std::path::PathBuf;

use tracing_subscriber::EnvFilter;

use crate::config::LoggingSettings;

/// Output format of log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable multi-line output.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

impl LogFormat {
    /// Parses a format name; anything but `json` is pretty.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Pretty,
        }
    }
}

/// Resolved logging configuration.
#[derive(Debug)]
pub struct LoggingConfig {
    /// Output format.
    pub format: LogFormat,
    /// Event filter.
    pub filter: EnvFilter,
    /// Append to this file instead of writing to stderr.
    pub file: Option<PathBuf>,
}

impl Clone for LoggingConfig {
    fn clone(&self) -> Self {
        Self {
            format: self.format,
            filter: EnvFilter::new(self.filter.to_string()),
            file: self.file.clone(),
        }
    }
}

impl LoggingConfig {
    /// Builds logging configuration from config settings with env overrides.
    ///
    /// The filter comes from `SATLOG_LOG`, then `RUST_LOG`, then the config
    /// file, then a default of `info` (`debug` when `verbose`). The format
    /// from `SATLOG_LOG_FORMAT` wins over the file.
    #[must_use]
    pub fn from_settings(settings: Option<&LoggingSettings>, verbose: bool) -> Self {
        Self::resolve(settings, verbose, |key| std::env::var(key).ok())
    }

    fn resolve<F>(settings: Option<&LoggingSettings>, verbose: bool, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let format = lookup("SATLOG_LOG_FORMAT")
            .or_else(|| settings.and_then(|s| s.format.clone()))
            .map_or_else(LogFormat::default, |format| LogFormat::parse(&format));

        let default_directive = if verbose { "debug" } else { "info" };
        let directive = lookup("SATLOG_LOG")
            .or_else(|| lookup("RUST_LOG"))
            .or_else(|| settings.and_then(|s| s.filter.clone()))
            .unwrap_or_else(|| default_directive.to_string());
        let filter = EnvFilter::try_new(&directive).unwrap_or_else(|err| {
            tracing::warn!(directive = %directive, "Invalid log filter ({err}), using default");
            EnvFilter::new(default_directive)
        });

        let file = settings
            .and_then(|s| s.file.as_deref())
            .map(str::trim)
            .filter(|path| !path.is_empty())
            .map(PathBuf::from);

        Self {
            format,
            filter,
            file,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn resolve(
        settings: Option<&LoggingSettings>,
        verbose: bool,
        env: &[(&str, &str)],
    ) -> LoggingConfig {
        let env: HashMap<String, String> = env
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        LoggingConfig::resolve(settings, verbose, |key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = resolve(None, false, &[]);
        assert_eq!(config.format, LogFormat::Pretty);
        assert_eq!(config.filter.to_string(), "info");
        assert!(config.file.is_none());

        assert_eq!(resolve(None, true, &[]).filter.to_string(), "debug");
    }

    #[test]
    fn test_env_wins_over_file() {
        let settings = LoggingSettings {
            format: Some("pretty".to_string()),
            filter: Some("warn".to_string()),
            file: Some("/var/log/satlog.log".to_string()),
        };
        let config = resolve(
            Some(&settings),
            false,
            &[("SATLOG_LOG_FORMAT", "json"), ("RUST_LOG", "satlog=trace")],
        );
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.filter.to_string(), "satlog=trace");
        assert_eq!(config.file, Some(PathBuf::from("/var/log/satlog.log")));
    }

    #[test]
    fn test_satlog_log_wins_over_rust_log() {
        let config = resolve(None, false, &[("SATLOG_LOG", "error"), ("RUST_LOG", "trace")]);
        assert_eq!(config.filter.to_string(), "error");
    }

    #[test]
    fn test_parse_format() {
        assert_eq!(LogFormat::parse("JSON"), LogFormat::Json);
        assert_eq!(LogFormat::parse("compact"), LogFormat::Pretty);
    }
}
