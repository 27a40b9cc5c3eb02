//! Two-line element set decoding.
//!
//! Field extraction is strictly positional. Columns below are 0-based byte
//! ranges:
//!
//! | field | line | columns |
//! |---|---|---|
//! | NORAD ID | 1 | `2..7` |
//! | epoch year (two digits, 20xx) | 1 | `18..20` |
//! | epoch day of year (day 1 = January 1st) | 1 | `20..32` |
//! | mean motion first derivative, sign / value (x2) | 1 | `33` / `34..43` |
//! | mean motion second derivative, sign / mantissa / exponent (x6) | 1 | `44` / `45..50` / `50..52` |
//! | B* drag term, sign / mantissa / exponent | 1 | `53` / `54..59` / `59..61` |
//! | inclination | 2 | `8..16` |
//! | right ascension of the ascending node | 2 | `17..25` |
//! | eccentricity (implied leading `0.`) | 2 | `26..33` |
//! | argument of periapsis | 2 | `34..42` |
//! | mean anomaly | 2 | `43..51` |
//! | mean motion | 2 | `52..63` |
//! | revolution count | 2 | `63..68` |
//!
//! Decoding is pure: the same two lines and context always give the same
//! result. A malformed field fails only the record it belongs to.

use std::collections::HashMap;
use std::ops::Range;
use std::path::Path;

use chrono::{TimeZone, Utc};
use thiserror::Error;

use super::MagnitudeTable;
use crate::models::{ElementSource, NoradId, OrbitalState};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Record-level decoding errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// A line does not reach the column being read.
    #[error("line {line} is too short ({len} characters)")]
    LineTooShort {
        /// Which of the two lines (1 or 2).
        line: u8,
        /// Length of the line.
        len: usize,
    },
    /// A line does not start with its line number.
    #[error("line {line} does not start with '{line} ': '{content}'")]
    UnexpectedLine {
        /// Expected line number.
        line: u8,
        /// Start of the offending line.
        content: String,
    },
    /// First line of a record with no second line after it.
    #[error("record for line '{0}' has no second line")]
    MissingSecondLine(String),
    /// A numeric field could not be parsed.
    #[error("invalid {field}: '{value}'")]
    InvalidField {
        /// Field name.
        field: &'static str,
        /// Raw column content.
        value: String,
    },
}

/// One decoded element record.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedElements {
    /// Catalog number of the object the elements describe.
    pub norad_id: NoradId,
    /// The decoded orbit.
    pub state: OrbitalState,
}

/// Everything a record needs besides its two lines.
#[derive(Debug, Clone, Copy)]
pub struct DecodeContext<'a> {
    /// Known magnitudes by NORAD ID.
    pub magnitudes: &'a MagnitudeTable,
    /// Fallback magnitude per subgroup name, used when the table has no entry.
    pub magnitude_overrides: &'a HashMap<String, f64>,
    /// Subgroup the element file belongs to, if any.
    pub subgroup: Option<&'a str>,
    /// Provenance stored with each orbit.
    pub source: ElementSource,
}

impl DecodeContext<'_> {
    /// Returns the magnitude for an object: the table value if known, else
    /// the override configured for the current subgroup, else `None`.
    #[must_use]
    pub fn magnitude_for(&self, norad_id: NoradId) -> Option<f64> {
        self.magnitudes.get(norad_id).or_else(|| {
            self.subgroup
                .and_then(|subgroup| self.magnitude_overrides.get(subgroup).copied())
        })
    }
}

/// Decoded content of an element file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementFile {
    /// Records that decoded successfully, in file order.
    pub records: Vec<DecodedElements>,
    /// Records that were skipped because they failed to decode.
    pub malformed: u64,
}

fn field(line: &str, line_no: u8, range: Range<usize>) -> Result<&str, DecodeError> {
    line.get(range).ok_or(DecodeError::LineTooShort {
        line: line_no,
        len: line.len(),
    })
}

fn parse_number<T: std::str::FromStr>(name: &'static str, raw: &str) -> Result<T, DecodeError> {
    raw.trim().parse().map_err(|_| DecodeError::InvalidField {
        field: name,
        value: raw.to_string(),
    })
}

const fn sign_of(column: &str) -> f64 {
    if matches!(column.as_bytes(), [b'-']) { -1.0 } else { 1.0 }
}

/// Reconstructs an eccentricity stored without its leading `0.`.
///
/// `"6703454"` decodes to `0.6703454`.
///
/// # Errors
///
/// Returns [`DecodeError::InvalidField`] unless the field is all digits.
pub fn decode_eccentricity(digits: &str) -> Result<f64, DecodeError> {
    let trimmed = digits.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DecodeError::InvalidField {
            field: "eccentricity",
            value: digits.to_string(),
        });
    }
    parse_number("eccentricity", &format!("0.{trimmed}"))
}

/// Reconstructs an implied-decimal value `sign x 0.mantissa x 10^exponent`.
///
/// `("-", "12345", "-3")` decodes to `-0.00012345`. A blank mantissa reads
/// as zero.
///
/// # Errors
///
/// Returns [`DecodeError::InvalidField`] if the mantissa is not all digits
/// or the exponent is not a signed integer.
pub fn decode_implied_decimal(sign: &str, mantissa: &str, exponent: &str) -> Result<f64, DecodeError> {
    let digits = mantissa.trim();
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DecodeError::InvalidField {
            field: "mantissa",
            value: mantissa.to_string(),
        });
    }
    let exponent: i32 = parse_number("exponent", exponent)?;
    let digits = if digits.is_empty() { "0" } else { digits };
    let magnitude: f64 = parse_number("mantissa", &format!("0.{digits}e{exponent}"))?;
    Ok(sign_of(sign) * magnitude)
}

/// Converts a two-digit year and fractional day of year to Unix seconds.
///
/// # Errors
///
/// Returns [`DecodeError::InvalidField`] if either part is out of range.
pub fn decode_epoch(year: &str, day_of_year: &str) -> Result<f64, DecodeError> {
    let yy: u8 = parse_number("epoch year", year)?;
    let day: f64 = parse_number("epoch day", day_of_year)?;
    if !(1.0..367.0).contains(&day) {
        return Err(DecodeError::InvalidField {
            field: "epoch day",
            value: day_of_year.to_string(),
        });
    }

    let new_year = Utc
        .with_ymd_and_hms(2000 + i32::from(yy), 1, 1, 0, 0, 0)
        .single()
        .ok_or_else(|| DecodeError::InvalidField {
            field: "epoch year",
            value: year.to_string(),
        })?;
    #[allow(clippy::cast_precision_loss)]
    let start = new_year.timestamp() as f64;
    Ok((day - 1.0).mul_add(SECONDS_PER_DAY, start))
}

/// Decodes one two-line record.
///
/// # Errors
///
/// Returns a [`DecodeError`] describing the first malformed field.
pub fn decode_record(
    line1: &str,
    line2: &str,
    context: &DecodeContext<'_>,
) -> Result<DecodedElements, DecodeError> {
    let line1 = line1.trim_end_matches(['\r', '\n']);
    let line2 = line2.trim_end_matches(['\r', '\n']);
    for (line_no, line) in [(1_u8, line1), (2_u8, line2)] {
        let prefix = if line_no == 1 { "1 " } else { "2 " };
        if !line.starts_with(prefix) {
            return Err(DecodeError::UnexpectedLine {
                line: line_no,
                content: line.chars().take(12).collect(),
            });
        }
    }

    let norad_id = NoradId::new(parse_number("NORAD ID", field(line1, 1, 2..7)?)?);
    let epoch = decode_epoch(field(line1, 1, 18..20)?, field(line1, 1, 20..32)?)?;

    let mean_motion_dot = sign_of(field(line1, 1, 33..34)?)
        * parse_number::<f64>("mean motion derivative", field(line1, 1, 34..43)?)?
        * 2.0;
    let mean_motion_ddot = decode_implied_decimal(
        field(line1, 1, 44..45)?,
        field(line1, 1, 45..50)?,
        field(line1, 1, 50..52)?,
    )? * 6.0;
    let bstar = decode_implied_decimal(
        field(line1, 1, 53..54)?,
        field(line1, 1, 54..59)?,
        field(line1, 1, 59..61)?,
    )?;

    let state = OrbitalState {
        norad_id,
        epoch,
        inclination: parse_number("inclination", field(line2, 2, 8..16)?)?,
        eccentricity: decode_eccentricity(field(line2, 2, 26..33)?)?,
        raan: parse_number("RAAN", field(line2, 2, 17..25)?)?,
        arg_periapsis: parse_number("argument of periapsis", field(line2, 2, 34..42)?)?,
        mean_anomaly: parse_number("mean anomaly", field(line2, 2, 43..51)?)?,
        mean_motion: parse_number("mean motion", field(line2, 2, 52..63)?)?,
        mean_motion_dot,
        mean_motion_ddot,
        bstar,
        magnitude: context.magnitude_for(norad_id),
        source: context.source,
        rev_count: parse_number("revolution count", field(line2, 2, 63..68)?)?,
    };

    Ok(DecodedElements { norad_id, state })
}

/// Decodes every record of an element file.
///
/// Name lines between records are ignored: a record starts at a line
/// beginning `"1 "` and takes the following line as its second line.
/// Records that fail to decode are logged, counted and skipped.
#[must_use]
pub fn parse_elements(text: &str, context: &DecodeContext<'_>) -> ElementFile {
    let lines: Vec<&str> = text.lines().map(|line| line.trim_end_matches('\r')).collect();
    let mut file = ElementFile::default();

    let mut index = 0;
    while index < lines.len() {
        let line1 = lines[index];
        if !line1.starts_with("1 ") {
            index += 1;
            continue;
        }

        let Some(line2) = lines.get(index + 1).copied() else {
            record_failure(&mut file, &DecodeError::MissingSecondLine(line1.to_string()), context);
            break;
        };

        match decode_record(line1, line2, context) {
            Ok(decoded) => {
                file.records.push(decoded);
                index += 2;
            },
            Err(err) => {
                record_failure(&mut file, &err, context);
                // A second line that is not one may be the start of the next record
                index += if line2.starts_with("2 ") { 2 } else { 1 };
            },
        }
    }

    file
}

fn record_failure(file: &mut ElementFile, err: &DecodeError, context: &DecodeContext<'_>) {
    tracing::warn!(
        error = %err,
        subgroup = context.subgroup.unwrap_or("-"),
        "Skipping malformed element record"
    );
    metrics::counter!("decode_failures_total", "feed" => "elements").increment(1);
    file.malformed += 1;
}

/// Reads and decodes an element file from disk.
///
/// # Errors
///
/// Returns [`crate::Error::OperationFailed`] if the file cannot be read.
/// Malformed records are skipped, not reported as errors.
pub fn read_element_file(path: &Path, context: &DecodeContext<'_>) -> crate::Result<ElementFile> {
    let text = std::fs::read_to_string(path).map_err(|e| crate::Error::OperationFailed {
        operation: "read_element_file".to_string(),
        cause: format!("{}: {e}", path.display()),
    })?;
    Ok(parse_elements(&text, context))
}
