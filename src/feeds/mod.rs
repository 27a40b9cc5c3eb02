//! Feed parsers.
//!
//! Every external feed is plain text or XML:
//!
//! - [`tle`]: two-line element sets
//! - [`satcat`]: the fixed-width master catalog
//! - [`annex`]: `|`-separated alternate names
//! - [`magnitudes`]: `mcnames` and `qs.mag` magnitude tables
//! - [`abbrevs`]: the abbreviation and group document

pub mod abbrevs;
pub mod annex;
pub mod magnitudes;
pub mod satcat;
pub mod tle;

use std::ops::Range;

pub use abbrevs::{CatalogAbbreviations, load_abbreviations, parse_abbreviations};
pub use annex::{AnnexEntry, AnnexName, parse_annex};
pub use magnitudes::MagnitudeTable;
pub use satcat::{SatcatFile, parse_satcat};
pub use tle::{
    DecodeContext, DecodeError, DecodedElements, ElementFile, decode_record, parse_elements,
    read_element_file,
};

/// Returns the trimmed content of a fixed-width column range.
///
/// Columns past the end of the line read as empty, and a range that ends
/// past the line is cut short, so trailing optional fields may be omitted.
pub(crate) fn fixed_field(line: &str, range: Range<usize>) -> &str {
    let end = range.end.min(line.len());
    let start = range.start.min(end);
    line.get(start..end).map_or("", str::trim)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_field_clamps_to_line() {
        assert_eq!(fixed_field("  12345 ABC", 0..7), "12345");
        assert_eq!(fixed_field("  12345 ABC", 8..20), "ABC");
        assert_eq!(fixed_field("short", 10..20), "");
    }
}
