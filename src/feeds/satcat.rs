//! SATCAT fixed-width catalog lines.
//!
//! Column layout (0-based byte ranges):
//!
//! | field | columns |
//! |---|---|
//! | COSPAR designator | `0..11` |
//! | NORAD ID | `13..18` |
//! | operational status | `21..22` |
//! | name | `23..47` |
//! | owner | `49..54` |
//! | launch date (year / month / day) | `56..60` / `61..63` / `64..66` |
//! | launch site | `68..73` |
//! | decay date (year / month / day) | `75..79` / `80..82` / `83..85` |
//! | orbital period (minutes) | `87..94` |
//! | orbit code: parent body + fate | `129..` |

use chrono::{TimeZone, Utc};

use super::{DecodeError, fixed_field};
use crate::models::{CatalogRecord, NoradId};

/// Orbit code of objects whose parent body is unknown.
const NO_ORBIT_CODE: &str = "NEA";

/// Decoded content of a SATCAT file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SatcatFile {
    /// Records in file order.
    pub records: Vec<CatalogRecord>,
    /// Lines that were skipped because they failed to decode.
    pub malformed: u64,
}

fn optional(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

fn parse_date(
    name: &'static str,
    year: &str,
    month: &str,
    day: &str,
) -> Result<Option<i64>, DecodeError> {
    if year.is_empty() {
        return Ok(None);
    }
    let invalid = || DecodeError::InvalidField {
        field: name,
        value: format!("{year}-{month}-{day}"),
    };
    let year: i32 = year.parse().map_err(|_| invalid())?;
    let month: u32 = month.parse().map_err(|_| invalid())?;
    let day: u32 = day.parse().map_err(|_| invalid())?;

    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
        .single()
        .map(|date| Some(date.timestamp()))
        .ok_or_else(invalid)
}

/// Decodes one SATCAT line.
///
/// # Errors
///
/// Returns [`DecodeError::InvalidField`] if the NORAD ID or a date is malformed.
pub fn parse_satcat_line(line: &str) -> Result<CatalogRecord, DecodeError> {
    let norad_raw = fixed_field(line, 13..18);
    let norad_id = norad_raw
        .parse::<u32>()
        .map_err(|_| DecodeError::InvalidField {
            field: "NORAD ID",
            value: norad_raw.to_string(),
        })?;

    let orbit = fixed_field(line, 129..line.len().max(129));
    let (orbital_parent, orbital_fate) = if orbit.len() == 3 && orbit != NO_ORBIT_CODE {
        (orbit.get(..2).and_then(optional), orbit.get(2..).and_then(optional))
    } else {
        (None, None)
    };

    Ok(CatalogRecord {
        norad_id: NoradId::new(norad_id),
        cospar_id: optional(fixed_field(line, 0..11)),
        name: fixed_field(line, 23..47).to_string(),
        status: optional(fixed_field(line, 21..22)),
        owner: optional(fixed_field(line, 49..54)),
        launch_site: optional(fixed_field(line, 68..73)),
        orbital_parent,
        orbital_fate,
        launch_date: parse_date(
            "launch date",
            fixed_field(line, 56..60),
            fixed_field(line, 61..63),
            fixed_field(line, 64..66),
        )?,
        decay_date: parse_date(
            "decay date",
            fixed_field(line, 75..79),
            fixed_field(line, 80..82),
            fixed_field(line, 83..85),
        )?,
        orbital_period: fixed_field(line, 87..94).parse().ok(),
    })
}

/// Decodes a SATCAT file, skipping blank and malformed lines.
#[must_use]
pub fn parse_satcat(text: &str) -> SatcatFile {
    let mut file = SatcatFile::default();
    for (index, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match parse_satcat_line(line) {
            Ok(record) => file.records.push(record),
            Err(err) => {
                tracing::warn!(line = index + 1, error = %err, "Skipping malformed catalog line");
                metrics::counter!("decode_failures_total", "feed" => "satcat").increment(1);
                file.malformed += 1;
            },
        }
    }
    file
}
