//! Prometheus metrics.
//!
//! Satlog runs as a short-lived batch job, so metrics are not scraped: the
//! recorder accumulates them in memory and [`flush`] pushes the rendered
//! exposition to a Prometheus push gateway when the process is done.

use crate::config::MetricsSettings;
use crate::{Error, Result};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;

/// Metrics configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsConfig {
    /// Whether metrics are enabled.
    pub enabled: bool,
    /// Push gateway endpoint (job URL).
    pub push_gateway: Option<String>,
}

impl MetricsConfig {
    /// Builds metrics configuration from config settings with env overrides.
    ///
    /// `SATLOG_METRICS_ENABLED` toggles recording and
    /// `SATLOG_METRICS_PUSH_GATEWAY` sets the endpoint. Configuring an
    /// endpoint enables metrics.
    #[must_use]
    pub fn from_settings(settings: Option<&MetricsSettings>) -> Self {
        Self::resolve(settings, |key| std::env::var(key).ok())
    }

    fn resolve<F>(settings: Option<&MetricsSettings>, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let push_gateway = lookup("SATLOG_METRICS_PUSH_GATEWAY").or_else(|| {
            settings
                .and_then(|s| s.push_gateway.as_deref())
                .map(str::trim)
                .filter(|endpoint| !endpoint.is_empty())
                .map(ToString::to_string)
        });

        let enabled = lookup("SATLOG_METRICS_ENABLED")
            .map(|value| parse_bool(&value))
            .or_else(|| settings.and_then(|s| s.enabled))
            .unwrap_or(push_gateway.is_some());

        Self {
            enabled,
            push_gateway,
        }
    }
}

fn parse_bool(value: &str) -> bool {
    let value = value.to_lowercase();
    value == "true" || value == "1" || value == "yes"
}

/// Metrics handle for flushing on shutdown.
#[derive(Debug)]
pub struct MetricsHandle {
    prometheus: PrometheusHandle,
    push_gateway: Option<String>,
}

impl MetricsHandle {
    /// Renders the current metrics in the Prometheus text format.
    #[must_use]
    pub fn render(&self) -> String {
        self.prometheus.render()
    }
}

/// Installs the Prometheus recorder as the global metrics recorder.
///
/// Returns `Ok(None)` when metrics are disabled.
///
/// # Errors
///
/// Returns an error if a global recorder is already installed.
pub fn install_prometheus(config: &MetricsConfig) -> Result<Option<MetricsHandle>> {
    if !config.enabled {
        return Ok(None);
    }

    let prometheus = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| Error::OperationFailed {
            operation: "metrics_recorder_install".to_string(),
            cause: e.to_string(),
        })?;

    Ok(Some(MetricsHandle {
        prometheus,
        push_gateway: config.push_gateway.clone(),
    }))
}

/// Pushes metrics to the push gateway if one is configured.
///
/// Push failures are logged and otherwise ignored.
pub fn flush(handle: &MetricsHandle) {
    let Some(endpoint) = &handle.push_gateway else {
        tracing::debug!("No push gateway configured, skipping flush");
        return;
    };

    let mut payload = handle.render();
    // Push gateway rejects payloads without a trailing newline
    if !payload.ends_with('\n') {
        payload.push('\n');
    }

    tracing::debug!(bytes = payload.len(), endpoint = %endpoint, "Pushing metrics to push gateway");

    let response = Client::new()
        .post(endpoint)
        .header(CONTENT_TYPE, "text/plain; version=0.0.4")
        .timeout(Duration::from_secs(5))
        .body(payload)
        .send();

    match response {
        Ok(resp) if resp.status().is_success() => {
            tracing::debug!(status = %resp.status(), "Metrics pushed successfully");
        },
        Ok(resp) => {
            tracing::warn!(status = %resp.status(), "Metrics push failed");
        },
        Err(err) => {
            tracing::warn!("Failed to push metrics: {err}");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn resolve(settings: Option<&MetricsSettings>, env: &[(&str, &str)]) -> MetricsConfig {
        let env: HashMap<String, String> = env
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        MetricsConfig::resolve(settings, |key| env.get(key).cloned())
    }

    #[test]
    fn test_disabled_by_default() {
        assert_eq!(resolve(None, &[]), MetricsConfig::default());
    }

    #[test]
    fn test_push_gateway_enables_metrics() {
        let settings = MetricsSettings {
            enabled: None,
            push_gateway: Some("http://pushgateway:9091/metrics/job/satlog".to_string()),
        };
        let config = resolve(Some(&settings), &[]);
        assert!(config.enabled);
        assert!(config.push_gateway.is_some());
    }

    #[test]
    fn test_env_overrides() {
        let settings = MetricsSettings {
            enabled: Some(true),
            push_gateway: None,
        };
        let config = resolve(
            Some(&settings),
            &[
                ("SATLOG_METRICS_ENABLED", "no"),
                ("SATLOG_METRICS_PUSH_GATEWAY", "http://localhost:9091/metrics/job/x"),
            ],
        );
        assert!(!config.enabled);
        assert_eq!(
            config.push_gateway.as_deref(),
            Some("http://localhost:9091/metrics/job/x")
        );
    }

    #[test]
    fn test_metrics_registry_smoke() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        metrics::with_local_recorder(&recorder, || {
            metrics::counter!("ingest_elements_total", "outcome" => "inserted").increment(1);
        });
        let rendered = handle.render();
        assert!(rendered.contains("ingest_elements_total"));
    }
}
