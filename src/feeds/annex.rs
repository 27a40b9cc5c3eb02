//! SATCAT annex and local extra-name lists.
//!
//! Each line is `NORAD|name|name|...`. A leading `*` marks the name the
//! object should be referred to by. Blank lines and lines starting with `#`
//! are ignored.

use super::DecodeError;
use crate::models::NoradId;

/// One alternate name from the annex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnexName {
    /// The name, without its `*` marker.
    pub name: String,
    /// Whether the name was marked as primary.
    pub is_canonical: bool,
}

/// All annex names listed for one object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnexEntry {
    /// Object the names belong to.
    pub norad_id: NoradId,
    /// Names in the order listed; empty names are dropped.
    pub names: Vec<AnnexName>,
}

/// Decodes one annex line.
///
/// Returns `Ok(None)` for blank and comment lines.
///
/// # Errors
///
/// Returns [`DecodeError::InvalidField`] if the NORAD ID is malformed.
pub fn parse_annex_line(line: &str) -> Result<Option<AnnexEntry>, DecodeError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut fields = line.split('|');
    let raw_id = fields.next().unwrap_or_default().trim();
    let norad_id = raw_id.parse::<u32>().map_err(|_| DecodeError::InvalidField {
        field: "NORAD ID",
        value: raw_id.to_string(),
    })?;

    let names = fields
        .filter_map(|field| {
            let field = field.trim();
            let (name, is_canonical) = field
                .strip_prefix('*')
                .map_or((field, false), |name| (name, true));
            (!name.is_empty()).then(|| AnnexName {
                name: name.to_string(),
                is_canonical,
            })
        })
        .collect();

    Ok(Some(AnnexEntry {
        norad_id: NoradId::new(norad_id),
        names,
    }))
}

/// Decodes an annex file, skipping malformed lines.
#[must_use]
pub fn parse_annex(text: &str) -> Vec<AnnexEntry> {
    text.lines()
        .enumerate()
        .filter_map(|(index, line)| match parse_annex_line(line) {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!(line = index + 1, error = %err, "Skipping malformed annex line");
                metrics::counter!("decode_failures_total", "feed" => "annex").increment(1);
                None
            },
        })
        .collect()
}
