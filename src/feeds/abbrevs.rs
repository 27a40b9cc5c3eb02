//! Catalog abbreviation document.
//!
//! An XML document maps the abbreviations used in SATCAT to display names
//! and lists the element-feed groups:
//!
//! ```xml
//! <satcat>
//!   <satelliteStatus>
//!     <item><abbrev>+</abbrev><name>Operational</name></item>
//!   </satelliteStatus>
//!   <orbitalParents>
//!     <item><abbrev>JU</abbrev><name>Jupiter</name><adjective>Jovian</adjective></item>
//!   </orbitalParents>
//!   <leoGroups>
//!     <item><group>Communications</group><subgroup>Starlink</subgroup><url>starlink.txt</url></item>
//!   </leoGroups>
//! </satcat>
//! ```

use std::path::Path;

use quick_xml::de::from_str;
use serde::Deserialize;

use crate::models::{ReferenceCode, ReferenceKind, SubgroupDefinition};
use crate::{Error, Result};

#[derive(Debug, Default, Deserialize)]
struct SatcatDocument {
    #[serde(rename = "satelliteStatus", default)]
    statuses: CodeList,
    #[serde(rename = "satelliteOwners", default)]
    owners: CodeList,
    #[serde(rename = "launchSites", default)]
    launch_sites: CodeList,
    #[serde(rename = "orbitalFates", default)]
    orbital_fates: CodeList,
    #[serde(rename = "orbitalParents", default)]
    orbital_parents: CodeList,
    #[serde(rename = "leoGroups", default)]
    groups: GroupList,
}

#[derive(Debug, Default, Deserialize)]
struct CodeList {
    #[serde(rename = "item", default)]
    items: Vec<CodeItem>,
}

#[derive(Debug, Deserialize)]
struct CodeItem {
    abbrev: String,
    name: String,
    adjective: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct GroupList {
    #[serde(rename = "item", default)]
    items: Vec<GroupItem>,
}

#[derive(Debug, Deserialize)]
struct GroupItem {
    group: String,
    subgroup: String,
    url: String,
}

/// Reference codes and group definitions read from the abbreviation document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogAbbreviations {
    /// Reference codes of every kind, in document order.
    pub codes: Vec<ReferenceCode>,
    /// Group/subgroup definitions, in document order.
    pub groups: Vec<SubgroupDefinition>,
}

impl CatalogAbbreviations {
    /// Returns the codes of one kind.
    pub fn codes_of(&self, kind: ReferenceKind) -> impl Iterator<Item = &ReferenceCode> {
        self.codes.iter().filter(move |code| code.kind == kind)
    }
}

fn collect_codes(kind: ReferenceKind, list: CodeList, codes: &mut Vec<ReferenceCode>) {
    codes.extend(list.items.into_iter().map(|item| ReferenceCode {
        kind,
        abbrev: item.abbrev.trim().to_string(),
        name: item.name.trim().to_string(),
        adjective: item
            .adjective
            .map(|adjective| adjective.trim().to_string())
            .filter(|adjective| !adjective.is_empty()),
    }));
}

/// Parses the abbreviation document.
///
/// Missing sections are treated as empty.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if the document is not well-formed or an
/// item lacks a required element.
pub fn parse_abbreviations(xml: &str) -> Result<CatalogAbbreviations> {
    let document: SatcatDocument = from_str(xml)
        .map_err(|e| Error::InvalidInput(format!("bad abbreviation document: {e}")))?;

    let mut codes = Vec::new();
    collect_codes(ReferenceKind::Status, document.statuses, &mut codes);
    collect_codes(ReferenceKind::Owner, document.owners, &mut codes);
    collect_codes(ReferenceKind::LaunchSite, document.launch_sites, &mut codes);
    collect_codes(ReferenceKind::OrbitalFate, document.orbital_fates, &mut codes);
    collect_codes(ReferenceKind::OrbitalParent, document.orbital_parents, &mut codes);

    let groups = document
        .groups
        .items
        .into_iter()
        .map(|item| SubgroupDefinition {
            group: item.group.trim().to_string(),
            subgroup: item.subgroup.trim().to_string(),
            feed: item.url.trim().to_string(),
        })
        .collect();

    Ok(CatalogAbbreviations { codes, groups })
}

/// Reads and parses the abbreviation document from disk.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_abbreviations(path: &Path) -> Result<CatalogAbbreviations> {
    let xml = std::fs::read_to_string(path).map_err(|e| Error::OperationFailed {
        operation: "read_abbreviations".to_string(),
        cause: format!("{}: {e}", path.display()),
    })?;
    parse_abbreviations(&xml)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<satcat>
  <satelliteStatus>
    <item><abbrev>+</abbrev><name>Operational</name></item>
    <item><abbrev>D</abbrev><name>Decayed</name></item>
  </satelliteStatus>
  <satelliteOwners>
    <item><abbrev>ISS</abbrev><name>International Space Station</name></item>
  </satelliteOwners>
  <launchSites>
    <item><abbrev>TYMSC</abbrev><name>Tyuratam Missile and Space Center</name></item>
  </launchSites>
  <orbitalFates>
    <item><abbrev>0</abbrev><name>Orbit</name></item>
  </orbitalFates>
  <orbitalParents>
    <item><abbrev>EA</abbrev><name>Earth</name><adjective>Terrestrial</adjective></item>
    <item><abbrev>JU</abbrev><name>Jupiter</name><adjective>Jovian</adjective></item>
  </orbitalParents>
  <leoGroups>
    <item><group>Special-Interest</group><subgroup>Space Stations</subgroup><url>stations.txt</url></item>
    <item><group>Special-Interest</group><subgroup>Tiangong</subgroup><url>[48274, 53239]</url></item>
  </leoGroups>
</satcat>
"#;

    #[test]
    fn test_parse_all_sections() {
        let abbreviations = parse_abbreviations(DOCUMENT).unwrap();

        assert_eq!(abbreviations.codes.len(), 7);
        assert_eq!(abbreviations.codes_of(ReferenceKind::Status).count(), 2);

        let jupiter = abbreviations
            .codes_of(ReferenceKind::OrbitalParent)
            .find(|code| code.abbrev == "JU")
            .unwrap();
        assert_eq!(jupiter.name, "Jupiter");
        assert_eq!(jupiter.adjective.as_deref(), Some("Jovian"));

        let owner = abbreviations.codes_of(ReferenceKind::Owner).next().unwrap();
        assert!(owner.adjective.is_none());

        assert_eq!(abbreviations.groups.len(), 2);
        assert_eq!(abbreviations.groups[1].subgroup, "Tiangong");
        assert_eq!(abbreviations.groups[1].feed, "[48274, 53239]");
    }

    #[test]
    fn test_missing_sections_are_empty() {
        let abbreviations = parse_abbreviations("<satcat></satcat>").unwrap();
        assert!(abbreviations.codes.is_empty());
        assert!(abbreviations.groups.is_empty());
    }

    #[test]
    fn test_item_without_name_is_rejected() {
        let xml = "<satcat><satelliteStatus><item><abbrev>+</abbrev></item></satelliteStatus></satcat>";
        assert!(matches!(parse_abbreviations(xml), Err(Error::InvalidInput(_))));
    }
}
