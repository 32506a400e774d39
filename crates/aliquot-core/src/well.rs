//! Microplate well positions and plate geometry.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Errors from parsing a well name such as `"B07"`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WellError {
    /// The row letter is missing or not A–Z.
    #[error("invalid well row in '{0}'")]
    InvalidRow(String),

    /// The column number is missing, zero, or not a number.
    #[error("invalid well column in '{0}'")]
    InvalidColumn(String),

    /// Zero-based indices beyond row Z or the largest column.
    #[error("well index out of range: row {row}, column {col}")]
    OutOfRange {
        /// Zero-based row index.
        row: u8,
        /// Zero-based column index.
        col: u8,
    },
}

/// Rows are lettered A through Z.
const MAX_ROWS: u8 = 26;

/// A well on a microplate, stored as zero-based row and column.
///
/// Parses from `"A1"`, `"a01"`, or `"H12"` and displays without zero padding.
/// Ordering is row-major (`A1 < A2 < B1`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WellPos {
    row: u8,
    col: u8,
}

impl WellPos {
    /// Create a well from zero-based row and column indices.
    ///
    /// Rows past `Z` and column index 255 are rejected.
    pub fn try_new(row: u8, col: u8) -> Result<Self, WellError> {
        if row < MAX_ROWS && col < u8::MAX {
            Ok(Self { row, col })
        } else {
            Err(WellError::OutOfRange { row, col })
        }
    }

    /// Indices must already be in range.
    pub(crate) const fn new(row: u8, col: u8) -> Self {
        Self { row, col }
    }

    /// Zero-based row index (`A` = 0).
    pub const fn row(&self) -> u8 {
        self.row
    }

    /// Zero-based column index (`1` = 0).
    pub const fn col(&self) -> u8 {
        self.col
    }

    /// Row letter.
    pub fn row_letter(&self) -> char {
        char::from(b'A' + self.row)
    }

    /// Next well in column-major order on `plate`, or `None` past the last well.
    pub fn next_by_column(&self, plate: PlateType) -> Option<Self> {
        if self.row + 1 < plate.rows() {
            Some(Self::new(self.row + 1, self.col))
        } else if self.col + 1 < plate.cols() {
            Some(Self::new(0, self.col + 1))
        } else {
            None
        }
    }
}

impl FromStr for WellPos {
    type Err = WellError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let mut chars = s.chars();
        let row = chars
            .next()
            .filter(char::is_ascii_alphabetic)
            .map(|c| c.to_ascii_uppercase() as u8 - b'A')
            .ok_or_else(|| WellError::InvalidRow(s.to_string()))?;
        let col: u8 = chars
            .as_str()
            .parse()
            .ok()
            .filter(|&c| c > 0)
            .ok_or_else(|| WellError::InvalidColumn(s.to_string()))?;
        Self::try_new(row, col - 1)
    }
}

impl fmt::Display for WellPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.row_letter(), self.col + 1)
    }
}

/// Microplate geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlateType {
    /// 8 rows by 12 columns.
    #[default]
    Wells96,
    /// 16 rows by 24 columns.
    Wells384,
}

impl PlateType {
    /// Number of rows.
    pub const fn rows(&self) -> u8 {
        match self {
            PlateType::Wells96 => 8,
            PlateType::Wells384 => 16,
        }
    }

    /// Number of columns.
    pub const fn cols(&self) -> u8 {
        match self {
            PlateType::Wells96 => 12,
            PlateType::Wells384 => 24,
        }
    }

    /// Total well count.
    pub const fn well_count(&self) -> usize {
        self.rows() as usize * self.cols() as usize
    }

    /// Returns `true` if `well` lies on this plate.
    pub fn contains(&self, well: WellPos) -> bool {
        well.row < self.rows() && well.col < self.cols()
    }

    /// Plate type from its well count (`96` or `384`).
    pub fn from_well_count(count: u32) -> Option<Self> {
        match count {
            96 => Some(PlateType::Wells96),
            384 => Some(PlateType::Wells384),
            _ => None,
        }
    }
}

impl fmt::Display for PlateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-well", self.well_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_padded_and_lowercase() {
        let w: WellPos = "a01".parse().unwrap();
        assert_eq!(w, WellPos::new(0, 0));
        assert_eq!("H12".parse::<WellPos>().unwrap(), WellPos::new(7, 11));
        assert_eq!("P24".parse::<WellPos>().unwrap().to_string(), "P24");
    }

    #[test]
    fn rejects_malformed_wells() {
        assert!(matches!("1A".parse::<WellPos>(), Err(WellError::InvalidRow(_))));
        assert!(matches!("A0".parse::<WellPos>(), Err(WellError::InvalidColumn(_))));
        assert!(matches!("B".parse::<WellPos>(), Err(WellError::InvalidColumn(_))));
    }

    #[test]
    fn checked_constructor_bounds_indices() {
        assert_eq!(WellPos::try_new(25, 0).unwrap().to_string(), "Z1");
        assert_eq!(
            WellPos::try_new(26, 0),
            Err(WellError::OutOfRange { row: 26, col: 0 })
        );
        assert!(WellPos::try_new(0, u8::MAX).is_err());
        assert_eq!("A255".parse::<WellPos>().unwrap().to_string(), "A255");
    }

    #[test]
    fn column_major_advance() {
        let plate = PlateType::Wells96;
        let h1: WellPos = "H1".parse().unwrap();
        assert_eq!(h1.next_by_column(plate), Some("A2".parse().unwrap()));
        let h12: WellPos = "H12".parse().unwrap();
        assert_eq!(h12.next_by_column(plate), None);
    }

    #[test]
    fn plate_bounds() {
        let i1: WellPos = "I1".parse().unwrap();
        assert!(!PlateType::Wells96.contains(i1));
        assert!(PlateType::Wells384.contains(i1));
        assert_eq!(PlateType::Wells384.well_count(), 384);
    }
}
