//! Tracked objects, their names, and catalog reference codes.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::NoradId;

/// A uniquely numbered physical object: satellite, debris fragment, or rocket body.
///
/// Descriptive attributes are overwritten wholesale on every catalog pass.
/// Reference fields hold row identifiers of [`ReferenceCode`] entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackedObject {
    /// NORAD catalog number (primary key).
    pub norad_id: NoradId,
    /// COSPAR international designator (secondary key, may be reassigned).
    pub cospar_id: Option<String>,
    /// Launch date (Unix seconds).
    pub launch_date: Option<i64>,
    /// Decay date (Unix seconds).
    pub decay_date: Option<i64>,
    /// Operational status reference.
    pub status: Option<i64>,
    /// Owner / source country reference.
    pub owner: Option<i64>,
    /// Launch site reference.
    pub launch_site: Option<i64>,
    /// Orbital fate reference.
    pub orbital_fate: Option<i64>,
    /// Orbital parent body reference.
    pub orbital_parent: Option<i64>,
    /// Orbital period in minutes.
    pub orbital_period: Option<f64>,
    /// Whether any of the object's names marks it as debris.
    pub is_debris: bool,
}

impl TrackedObject {
    /// Creates an attribute-less stub for a newly sighted object.
    #[must_use]
    pub fn stub(norad_id: NoradId) -> Self {
        Self {
            norad_id,
            ..Self::default()
        }
    }
}

/// One incoming catalog entry, with reference fields still in abbreviated form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogRecord {
    /// NORAD catalog number.
    pub norad_id: NoradId,
    /// COSPAR designator; `None` when the feed leaves it blank.
    pub cospar_id: Option<String>,
    /// Name as printed in the catalog (may carry bracketed annotations).
    pub name: String,
    /// Operational status abbreviation.
    pub status: Option<String>,
    /// Owner abbreviation.
    pub owner: Option<String>,
    /// Launch site abbreviation.
    pub launch_site: Option<String>,
    /// Orbital parent abbreviation (two characters).
    pub orbital_parent: Option<String>,
    /// Orbital fate abbreviation (one character).
    pub orbital_fate: Option<String>,
    /// Launch date (Unix seconds).
    pub launch_date: Option<i64>,
    /// Decay date (Unix seconds).
    pub decay_date: Option<i64>,
    /// Orbital period in minutes.
    pub orbital_period: Option<f64>,
}

/// Feed a name was imported from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NameSource {
    /// The master catalog.
    Satcat,
    /// The catalog annex and locally maintained extra names.
    Annex,
}

impl NameSource {
    /// Returns the numeric code stored with each name.
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::Satcat => 0,
            Self::Annex => 1,
        }
    }

    /// Maps a stored numeric code back to a source.
    #[must_use]
    pub const fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Satcat),
            1 => Some(Self::Annex),
            _ => None,
        }
    }
}

/// A name bound to a tracked object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectName {
    /// Object the name belongs to.
    pub norad_id: NoradId,
    /// The name.
    pub name: String,
    /// Feed the name came from.
    pub source: NameSource,
    /// Whether this is the name the object should be referred to by.
    pub is_canonical: bool,
}

/// Kinds of catalog reference code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    /// Operational status (`+`, `-`, `D`...).
    Status,
    /// Owner or source country.
    Owner,
    /// Launch site.
    LaunchSite,
    /// Orbital fate (orbit, landing, impact...).
    OrbitalFate,
    /// Body the object orbits.
    OrbitalParent,
}

impl ReferenceKind {
    /// All reference kinds in catalog order.
    pub const ALL: [Self; 5] = [
        Self::Status,
        Self::Owner,
        Self::LaunchSite,
        Self::OrbitalFate,
        Self::OrbitalParent,
    ];

    /// Returns the kind as a string slice.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Owner => "owner",
            Self::LaunchSite => "launch_site",
            Self::OrbitalFate => "orbital_fate",
            Self::OrbitalParent => "orbital_parent",
        }
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Abbreviation and display name of one reference code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceCode {
    /// Kind of code.
    pub kind: ReferenceKind,
    /// Abbreviation used in the catalog.
    pub abbrev: String,
    /// Display name.
    pub name: String,
    /// Adjectival form, e.g. "Jovian" for Jupiter.
    pub adjective: Option<String>,
}
