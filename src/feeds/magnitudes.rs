//! Standard magnitude tables.
//!
//! Two fixed-width tables give the absolute magnitude of well-known objects:
//!
//! - `mcnames`: NORAD ID in columns `0..5`, pessimistic magnitude in `37..42`
//! - `qs.mag`: NORAD ID in columns `0..5`, full-phase magnitude in `33..37`
//!
//! `qs.mag` values are quoted at full phase and are shifted to the 90 degree
//! reference phase used everywhere else. When both tables list an object,
//! the `qs.mag` value wins.

use std::collections::HashMap;

use super::fixed_field;
use crate::models::NoradId;

/// Offset added to full-phase `qs.mag` magnitudes.
pub const QSMAG_PHASE_OFFSET: f64 = 1.242_874_681_735_334_4;

/// Known absolute magnitudes by NORAD ID.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MagnitudeTable {
    magnitudes: HashMap<NoradId, f64>,
}

impl MagnitudeTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the magnitude of an object, if known.
    #[must_use]
    pub fn get(&self, norad_id: NoradId) -> Option<f64> {
        self.magnitudes.get(&norad_id).copied()
    }

    /// Sets the magnitude of an object, replacing any previous value.
    pub fn insert(&mut self, norad_id: NoradId, magnitude: f64) {
        self.magnitudes.insert(norad_id, magnitude);
    }

    /// Number of objects with a known magnitude.
    #[must_use]
    pub fn len(&self) -> usize {
        self.magnitudes.len()
    }

    /// Returns true if no magnitudes are known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.magnitudes.is_empty()
    }

    /// Adds the entries of an `mcnames` table.
    ///
    /// # Returns
    ///
    /// Number of entries read.
    pub fn load_mcnames(&mut self, text: &str) -> usize {
        self.load_columns(text, 37..42, 0.0)
    }

    /// Adds the entries of a `qs.mag` table, overriding existing values.
    ///
    /// # Returns
    ///
    /// Number of entries read.
    pub fn load_qsmag(&mut self, text: &str) -> usize {
        self.load_columns(text, 33..37, QSMAG_PHASE_OFFSET)
    }

    fn load_columns(&mut self, text: &str, magnitude: std::ops::Range<usize>, offset: f64) -> usize {
        let mut loaded = 0;
        for line in text.lines() {
            let id = fixed_field(line, 0..5).parse::<u32>();
            let value = fixed_field(line, magnitude.clone()).parse::<f64>();
            // Headers, comments and objects without a magnitude are skipped
            if let (Ok(id), Ok(value)) = (id, value) {
                self.insert(NoradId::new(id), value + offset);
                loaded += 1;
            }
        }
        loaded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MCNAMES: &str = "\
00694 ATLAS CENTAUR 2                  4.5 v
00733 THOR AGENA D R/B                 4.2 v
00877 SL-3 R/B                         4.8 v
Name line without a number
";

    const QSMAG: &str = "\
00694 ATLAS CENTAUR 2             3.0
25544 ISS                        -1.3
";

    #[test]
    fn test_load_mcnames() {
        let mut table = MagnitudeTable::new();
        let loaded = table.load_mcnames(MCNAMES);

        assert_eq!(loaded, 3);
        assert_eq!(table.get(NoradId::new(733)), Some(4.2));
        assert_eq!(table.get(NoradId::new(877)), Some(4.8));
        assert_eq!(table.get(NoradId::new(1)), None);
    }

    #[test]
    fn test_qsmag_overrides_mcnames_with_phase_offset() {
        let mut table = MagnitudeTable::new();
        table.load_mcnames(MCNAMES);
        let loaded = table.load_qsmag(QSMAG);

        assert_eq!(loaded, 2);
        let iss = table.get(NoradId::new(25544)).unwrap();
        assert!((iss - (-1.3 + QSMAG_PHASE_OFFSET)).abs() < 1e-12);
        let atlas = table.get(NoradId::new(694)).unwrap();
        assert!((atlas - (3.0 + QSMAG_PHASE_OFFSET)).abs() < 1e-12);
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn test_short_lines_are_skipped() {
        let mut table = MagnitudeTable::new();
        assert_eq!(table.load_mcnames("12345 SHORT\n\n"), 0);
        assert!(table.is_empty());
    }
}
