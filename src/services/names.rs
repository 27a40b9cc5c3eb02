//! Catalog name normalization.
//!
//! Catalog names often carry alternate designations in a trailing
//! annotation, e.g. `"ISS (ZARYA)"` or `"COSMOS 2251 [DEB]"`. Each name is
//! decomposed into one main component plus the recursively decomposed
//! content of its annotations, and every component is stored as its own
//! name record.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::IngestSettings;
use crate::models::{NameSource, NoradId, ObjectName};
use crate::storage::CatalogSession;
use crate::Result;

/// Trailing `( ... )` annotation with at least two characters inside.
static PAREN_ANNOTATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*)\((.{2,})\)$").unwrap_or_else(|_| unreachable!()));

/// Trailing `[ ... ]` annotation with at least two characters inside.
static BRACKET_ANNOTATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*)\[(.{2,})\]$").unwrap_or_else(|_| unreachable!()));

/// One name produced by decomposing a catalog name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameComponent {
    /// The name, trimmed.
    pub name: String,
    /// Whether the component is the canonical name.
    pub is_canonical: bool,
}

/// Decomposes a raw name into its components.
///
/// Trailing parenthesized or bracketed annotations are split off, last
/// first, until the main component ends in neither. Annotation content is
/// decomposed the same way and never canonical; only the main component
/// inherits `canonical`. Alternates come before the main component, and
/// empty components are dropped.
#[must_use]
pub fn decompose_name(name: &str, canonical: bool) -> Vec<NameComponent> {
    let mut components = Vec::new();
    decompose_into(name, canonical, &mut components);
    components
}

fn decompose_into(name: &str, canonical: bool, components: &mut Vec<NameComponent>) {
    let mut main = name.trim();
    while let Some((head, annotation)) = split_annotation(main) {
        decompose_into(annotation, false, components);
        main = head.trim();
    }

    if !main.is_empty() {
        components.push(NameComponent {
            name: main.to_string(),
            is_canonical: canonical,
        });
    }
}

/// Splits one trailing annotation off `name`, returning the head and the
/// annotation content.
fn split_annotation(name: &str) -> Option<(&str, &str)> {
    [&*PAREN_ANNOTATION, &*BRACKET_ANNOTATION]
        .into_iter()
        .find_map(|pattern| {
            let captures = pattern.captures(name)?;
            Some((captures.get(1)?.as_str(), captures.get(2)?.as_str()))
        })
}

/// Returns true if `marker` occurs in `name` as a whole token.
///
/// Matching ignores ASCII case, and a token boundary is any character that
/// is not alphanumeric.
#[must_use]
pub fn contains_marker(name: &str, marker: &str) -> bool {
    if marker.is_empty() {
        return false;
    }
    let name = name.to_ascii_uppercase();
    let marker = marker.to_ascii_uppercase();
    let is_boundary = |c: Option<char>| c.is_none_or(|c| !c.is_alphanumeric());

    name.match_indices(&marker).any(|(start, _)| {
        is_boundary(name[..start].chars().next_back())
            && is_boundary(name[start + marker.len()..].chars().next())
    })
}

/// Stores decomposed names and maintains the canonical-name and debris invariants.
#[derive(Debug, Clone)]
pub struct NameNormalizer {
    debris_markers: Vec<String>,
}

impl Default for NameNormalizer {
    fn default() -> Self {
        Self::from_settings(&IngestSettings::default())
    }
}

impl NameNormalizer {
    /// Creates a normalizer recognizing the given debris markers.
    #[must_use]
    pub const fn new(debris_markers: Vec<String>) -> Self {
        Self { debris_markers }
    }

    /// Creates a normalizer from ingest settings.
    #[must_use]
    pub fn from_settings(settings: &IngestSettings) -> Self {
        Self::new(settings.debris_markers.clone())
    }

    /// Returns true if the name marks its object as debris.
    #[must_use]
    pub fn is_debris_name(&self, name: &str) -> bool {
        self.debris_markers
            .iter()
            .any(|marker| contains_marker(name, marker))
    }

    /// Inserts every component of a name for an object.
    ///
    /// Before a canonical component is stored, every canonical name of the
    /// object, whatever its source, is demoted. Storing the same name from
    /// the same source again updates the existing record. Returns the
    /// number of components stored.
    ///
    /// # Errors
    ///
    /// Returns an error if a storage operation fails.
    pub fn insert_name<S>(
        &self,
        session: &S,
        norad_id: NoradId,
        name: &str,
        source: NameSource,
        canonical: bool,
    ) -> Result<usize>
    where
        S: CatalogSession + ?Sized,
    {
        let components = decompose_name(name, canonical);
        for component in &components {
            if component.is_canonical {
                session.demote_canonical_names(norad_id)?;
            }
            session.upsert_name(&ObjectName {
                norad_id,
                name: component.name.clone(),
                source,
                is_canonical: component.is_canonical,
            })?;
            if self.is_debris_name(&component.name) {
                tracing::debug!(norad_id = %norad_id, name = %component.name, "Marking object as debris");
                session.set_debris(norad_id)?;
            }
        }
        Ok(components.len())
    }
}
