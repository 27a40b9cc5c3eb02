//! Orbital state snapshots.

use serde::{Deserialize, Serialize};
use std::fmt;

/// NORAD catalog number of a tracked object.
///
/// Stable, externally assigned, and the primary key of the catalog.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct NoradId(u32);

impl NoradId {
    /// Creates a NORAD ID from its numeric value.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the numeric value.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NoradId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for NoradId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// Storage identifier of a persisted [`OrbitalState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrbitId(i64);

impl OrbitId {
    /// Wraps a generated row identifier.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for OrbitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Provenance of a set of orbital elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ElementSource {
    /// Per-subgroup element files published by Celestrak.
    Celestrak,
    /// Bulk catalog download from space-track.
    SpaceTrack,
}

impl ElementSource {
    /// Returns the numeric code stored alongside each orbit.
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::Celestrak => 0,
            Self::SpaceTrack => 1,
        }
    }

    /// Maps a stored numeric code back to a source.
    #[must_use]
    pub const fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Celestrak),
            1 => Some(Self::SpaceTrack),
            _ => None,
        }
    }
}

/// Immutable snapshot of an object's mean orbital elements at one epoch.
///
/// Angles are in degrees, mean motion in revolutions per day, and `epoch`
/// in Unix seconds. Two states of the same object are treated as the same
/// orbit when their epochs differ by no more than the configured tolerance
/// (see [`OrbitalState::same_orbit_as`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrbitalState {
    /// Object the elements describe.
    pub norad_id: NoradId,
    /// Epoch of the element set (Unix seconds).
    pub epoch: f64,
    /// Inclination.
    pub inclination: f64,
    /// Eccentricity (0 <= e < 1).
    pub eccentricity: f64,
    /// Right ascension of the ascending node.
    pub raan: f64,
    /// Argument of periapsis.
    pub arg_periapsis: f64,
    /// Mean anomaly.
    pub mean_anomaly: f64,
    /// Mean motion.
    pub mean_motion: f64,
    /// First time-derivative of mean motion.
    pub mean_motion_dot: f64,
    /// Second time-derivative of mean motion.
    pub mean_motion_ddot: f64,
    /// B* drag term.
    pub bstar: f64,
    /// Absolute magnitude, when known.
    pub magnitude: Option<f64>,
    /// Feed the elements came from.
    pub source: ElementSource,
    /// Revolution count at epoch.
    pub rev_count: u32,
}

impl OrbitalState {
    /// Returns true if `other` describes the same orbit of the same object.
    #[must_use]
    pub fn same_orbit_as(&self, other: &Self, tolerance: f64) -> bool {
        self.norad_id == other.norad_id && (self.epoch - other.epoch).abs() <= tolerance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(norad: u32, epoch: f64) -> OrbitalState {
        OrbitalState {
            norad_id: NoradId::new(norad),
            epoch,
            inclination: 51.6,
            eccentricity: 0.0005,
            raan: 10.0,
            arg_periapsis: 20.0,
            mean_anomaly: 30.0,
            mean_motion: 15.5,
            mean_motion_dot: 0.0,
            mean_motion_ddot: 0.0,
            bstar: 0.0,
            magnitude: None,
            source: ElementSource::Celestrak,
            rev_count: 1,
        }
    }

    #[test]
    fn test_same_orbit_within_tolerance() {
        let a = state(25544, 1_000.0);
        assert!(a.same_orbit_as(&state(25544, 1_001.0), 1.0));
        assert!(!a.same_orbit_as(&state(25544, 1_001.5), 1.0));
        assert!(!a.same_orbit_as(&state(25545, 1_000.0), 1.0));
    }

    #[test]
    fn test_element_source_codes() {
        for source in [ElementSource::Celestrak, ElementSource::SpaceTrack] {
            assert_eq!(ElementSource::from_code(source.code()), Some(source));
        }
        assert_eq!(ElementSource::from_code(7), None);
    }
}
