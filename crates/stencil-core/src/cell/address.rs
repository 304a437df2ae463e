//! Cell reference type

use crate::column::ColumnId;
use crate::error::{Error, Result};
use crate::MAX_ROWS;
use std::fmt;
use std::str::FromStr;

/// A cell reference (e.g., "B2")
///
/// Rows are 1-based, exactly as they appear in the worksheet's `r` attributes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CellRef {
    /// Column identifier
    pub column: ColumnId,
    /// Row number (1-based)
    pub row: u32,
}

impl CellRef {
    /// Create a new cell reference
    pub fn new(column: ColumnId, row: u32) -> Self {
        Self { column, row }
    }

    /// Parse a cell reference from A1-style notation
    ///
    /// `$` markers are accepted and dropped, since worksheet cell references never
    /// carry them but user input sometimes does.
    ///
    /// # Examples
    /// ```
    /// use stencil_core::CellRef;
    ///
    /// let cell = CellRef::parse("AB12").unwrap();
    /// assert_eq!(cell.column.as_str(), "AB");
    /// assert_eq!(cell.row, 12);
    ///
    /// let cell = CellRef::parse("$c$3").unwrap();
    /// assert_eq!(cell.to_string(), "C3");
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::InvalidReference("empty reference".into()));
        }

        let bytes = s.as_bytes();
        let mut pos = 0;

        if bytes.get(pos) == Some(&b'$') {
            pos += 1;
        }

        let col_start = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_alphabetic() {
            pos += 1;
        }
        if pos == col_start {
            return Err(Error::InvalidReference(format!(
                "no column letters in '{}'",
                s
            )));
        }
        let column = ColumnId::parse(&s[col_start..pos])
            .map_err(|e| Error::InvalidReference(format!("'{}': {}", s, e)))?;

        if bytes.get(pos) == Some(&b'$') {
            pos += 1;
        }

        let row_str = &s[pos..];
        if row_str.is_empty() || !row_str.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidReference(format!(
                "invalid row number in '{}'",
                s
            )));
        }
        let row: u32 = row_str
            .parse()
            .map_err(|_| Error::InvalidReference(format!("invalid row number in '{}'", s)))?;

        if row == 0 || row > MAX_ROWS {
            return Err(Error::InvalidReference(format!(
                "row number out of range in '{}'",
                s
            )));
        }

        Ok(Self { column, row })
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.column, self.row)
    }
}

impl FromStr for CellRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_ref_parse() {
        let cell = CellRef::parse("A1").unwrap();
        assert_eq!(cell.column.as_str(), "A");
        assert_eq!(cell.row, 1);

        let cell = CellRef::parse("XFD1048576").unwrap();
        assert_eq!(cell.column.position(), 16384);
        assert_eq!(cell.row, 1048576);

        let cell = CellRef::parse("b2").unwrap();
        assert_eq!(cell.to_string(), "B2");
    }

    #[test]
    fn test_cell_ref_parse_errors() {
        assert!(CellRef::parse("").is_err());
        assert!(CellRef::parse("A").is_err());
        assert!(CellRef::parse("1").is_err());
        assert!(CellRef::parse("A0").is_err());
        assert!(CellRef::parse("A-1").is_err());
        assert!(CellRef::parse("A1048577").is_err());
        assert!(CellRef::parse("XFE1").is_err());
        assert!(CellRef::parse("A1B").is_err());
    }
}
