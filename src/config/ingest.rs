//! Ingestion tuning.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Parameters of the reconciliation and history merge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestSettings {
    /// Two element sets of one object whose epochs differ by at most this
    /// many seconds describe the same orbit.
    pub epoch_tolerance_secs: f64,
    /// Orbits first measured longer ago than this are not carried forward.
    pub max_gap_fill_age_days: f64,
    /// Name tokens that mark an object as debris.
    pub debris_markers: Vec<String>,
    /// Magnitude used for objects of a subgroup when no table lists them.
    pub magnitude_overrides: HashMap<String, f64>,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            epoch_tolerance_secs: 1.0,
            max_gap_fill_age_days: 10.0,
            debris_markers: vec!["DEB".to_string()],
            magnitude_overrides: HashMap::new(),
        }
    }
}

impl IngestSettings {
    /// Maximum gap-fill age in seconds.
    #[must_use]
    pub fn max_gap_fill_age_secs(&self) -> f64 {
        self.max_gap_fill_age_days * SECONDS_PER_DAY
    }

    /// Sets the epoch tolerance.
    #[must_use]
    pub const fn with_epoch_tolerance(mut self, secs: f64) -> Self {
        self.epoch_tolerance_secs = secs;
        self
    }

    /// Sets the maximum gap-fill age.
    #[must_use]
    pub const fn with_max_gap_fill_age_days(mut self, days: f64) -> Self {
        self.max_gap_fill_age_days = days;
        self
    }

    pub(super) fn merge(&mut self, file: ConfigFileIngest) -> crate::Result<()> {
        if let Some(v) = file.epoch_tolerance_secs {
            if !v.is_finite() || v < 0.0 {
                return Err(crate::Error::InvalidInput(format!(
                    "ingest.epoch_tolerance_secs must be a non-negative number, got {v}"
                )));
            }
            self.epoch_tolerance_secs = v;
        }
        if let Some(v) = file.max_gap_fill_age_days {
            if !v.is_finite() || v < 0.0 {
                return Err(crate::Error::InvalidInput(format!(
                    "ingest.max_gap_fill_age_days must be a non-negative number, got {v}"
                )));
            }
            self.max_gap_fill_age_days = v;
        }
        if let Some(markers) = file.debris_markers {
            self.debris_markers = markers
                .into_iter()
                .map(|marker| marker.trim().to_string())
                .filter(|marker| !marker.is_empty())
                .collect();
        }
        if let Some(overrides) = file.magnitude_overrides {
            self.magnitude_overrides = overrides;
        }
        Ok(())
    }
}

/// `[ingest]` section in the config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileIngest {
    /// Epoch tolerance.
    pub epoch_tolerance_secs: Option<f64>,
    /// Maximum gap-fill age.
    pub max_gap_fill_age_days: Option<f64>,
    /// Debris markers.
    pub debris_markers: Option<Vec<String>>,
    /// Per-subgroup magnitudes.
    pub magnitude_overrides: Option<HashMap<String, f64>>,
}
