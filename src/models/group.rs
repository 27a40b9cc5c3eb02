//! Satellite groups and subgroups.
//!
//! Element feeds are organised into groups (e.g. "Communications") and
//! subgroups (e.g. "Starlink"). Each subgroup carries a feed descriptor that
//! is either the name of an element file to download, or an explicit JSON
//! list of the NORAD IDs that belong to it.
//!
//! # Example
//!
//! ```rust
//! use satlog::models::SubgroupFeed;
//!
//! let feed = SubgroupFeed::parse("[25544, 48274]").unwrap();
//! assert_eq!(feed.members().map(<[_]>::len), Some(2));
//!
//! let feed = SubgroupFeed::parse("stations.txt").unwrap();
//! assert_eq!(feed.file_name(), Some("stations.txt"));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use super::NoradId;
use crate::{Error, Result};

/// Generated identifier of a subgroup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubgroupId(i64);

impl SubgroupId {
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

impl fmt::Display for SubgroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where the members of a subgroup come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubgroupFeed {
    /// Element file on the element-feed base URL.
    File(String),
    /// Fixed list of members with no element file of their own.
    Members(Vec<NoradId>),
}

impl SubgroupFeed {
    /// Parses a feed descriptor as stored in the catalog document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the descriptor is empty or looks
    /// like a JSON list but does not parse as one.
    pub fn parse(descriptor: &str) -> Result<Self> {
        let descriptor = descriptor.trim();
        if descriptor.is_empty() {
            return Err(Error::InvalidInput("empty subgroup feed".to_string()));
        }
        if descriptor.starts_with('[') {
            let ids: Vec<u32> = serde_json::from_str(descriptor).map_err(|e| {
                Error::InvalidInput(format!("bad subgroup member list '{descriptor}': {e}"))
            })?;
            return Ok(Self::Members(ids.into_iter().map(NoradId::new).collect()));
        }
        Ok(Self::File(descriptor.to_string()))
    }

    /// Returns the descriptor in its stored form.
    #[must_use]
    pub fn descriptor(&self) -> String {
        match self {
            Self::File(name) => name.clone(),
            Self::Members(ids) => {
                let ids: Vec<String> = ids.iter().map(ToString::to_string).collect();
                format!("[{}]", ids.join(", "))
            },
        }
    }

    /// Returns the file name, if this feed is an element file.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        match self {
            Self::File(name) => Some(name),
            Self::Members(_) => None,
        }
    }

    /// Returns the fixed member list, if this feed is one.
    #[must_use]
    pub fn members(&self) -> Option<&[NoradId]> {
        match self {
            Self::File(_) => None,
            Self::Members(ids) => Some(ids),
        }
    }
}

/// A subgroup together with the name of its parent group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subgroup {
    /// Generated identifier.
    pub id: SubgroupId,
    /// Name of the parent group.
    pub group: String,
    /// Subgroup name, e.g. "Starlink".
    pub name: String,
    /// Where members come from.
    pub feed: SubgroupFeed,
}

/// Group/subgroup entry as listed in the catalog document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubgroupDefinition {
    /// Parent group name.
    pub group: String,
    /// Subgroup name.
    pub subgroup: String,
    /// Feed descriptor (file name or JSON list of NORAD IDs).
    pub feed: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_member_list() {
        let feed = SubgroupFeed::parse(" [1, 2, 3] ").unwrap();
        assert_eq!(
            feed.members(),
            Some(&[NoradId::new(1), NoradId::new(2), NoradId::new(3)][..])
        );
        assert!(feed.file_name().is_none());
    }

    #[test]
    fn test_parse_file_name() {
        let feed = SubgroupFeed::parse("starlink.txt").unwrap();
        assert_eq!(feed.file_name(), Some("starlink.txt"));
        assert_eq!(feed.descriptor(), "starlink.txt");
    }

    #[test]
    fn test_parse_rejects_bad_list() {
        assert!(SubgroupFeed::parse("[1, two]").is_err());
        assert!(SubgroupFeed::parse("   ").is_err());
    }

    #[test]
    fn test_descriptor_roundtrip_for_members() {
        let feed = SubgroupFeed::Members(vec![NoradId::new(5), NoradId::new(6)]);
        assert_eq!(SubgroupFeed::parse(&feed.descriptor()).unwrap(), feed);
    }
}
