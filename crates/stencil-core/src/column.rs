//! Column identifiers and their ordering
//!
//! A column identifier is the bijective base-26 spelling of a 1-based column
//! position: `1 = A`, `26 = Z`, `27 = AA`, `28 = AB`. There is no zero digit, so
//! a shorter identifier always names an earlier column than a longer one.

use crate::error::{Error, Result};
use crate::MAX_COLS;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Compare two canonical (uppercase) column identifiers.
///
/// Length settles the order first, equal lengths fall back to a lexical
/// comparison. This matches the numeric order of the positions they encode.
///
/// ```
/// use std::cmp::Ordering;
/// use stencil_core::compare_columns;
///
/// assert_eq!(compare_columns("Z", "AA"), Ordering::Less);
/// assert_eq!(compare_columns("AB", "AA"), Ordering::Greater);
/// assert_eq!(compare_columns("C", "C"), Ordering::Equal);
/// ```
pub fn compare_columns(a: &str, b: &str) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// A canonical column identifier (uppercase letters, `A` through `XFD`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnId(String);

impl ColumnId {
    /// Parse column letters, case-insensitively.
    ///
    /// Surrounding whitespace is ignored. Anything other than ASCII letters, or a
    /// column past the last worksheet column, is an
    /// [`Error::InvalidCoordinate`].
    pub fn parse(letters: &str) -> Result<Self> {
        let letters = letters.trim();
        if letters.is_empty() {
            return Err(Error::coordinate("empty column letters"));
        }
        if let Some(c) = letters.chars().find(|c| !c.is_ascii_alphabetic()) {
            return Err(Error::coordinate(format!(
                "invalid column letter '{}' in '{}'",
                c, letters
            )));
        }

        let canonical = letters.to_ascii_uppercase();
        let position = letters_to_position(&canonical);
        if position > MAX_COLS as u64 {
            return Err(Error::coordinate(format!(
                "column {} is past the last column ({})",
                canonical,
                MAX_COLS
            )));
        }

        Ok(Self(canonical))
    }

    /// Build the identifier for a 1-based column position
    ///
    /// ```
    /// use stencil_core::ColumnId;
    ///
    /// assert_eq!(ColumnId::from_position(28).unwrap().as_str(), "AB");
    /// assert!(ColumnId::from_position(0).is_err());
    /// ```
    pub fn from_position(position: u32) -> Result<Self> {
        if position < 1 {
            return Err(Error::coordinate("column cannot be less than 1"));
        }
        if position > MAX_COLS {
            return Err(Error::coordinate(format!(
                "column {} is past the last column ({})",
                position, MAX_COLS
            )));
        }

        let mut result = Vec::new();
        let mut n = position;
        while n > 0 {
            n -= 1;
            result.push(b'A' + (n % 26) as u8);
            n /= 26;
        }
        result.reverse();

        // Only ASCII uppercase bytes were pushed
        Ok(Self(result.into_iter().map(char::from).collect()))
    }

    /// The 1-based position this identifier encodes
    pub fn position(&self) -> u32 {
        // Bounded by MAX_COLS at construction
        letters_to_position(&self.0) as u32
    }

    /// The identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Accumulate bijective base-26 digits. Saturates instead of overflowing so
/// pathological inputs are still rejected by the bounds check.
fn letters_to_position(letters: &str) -> u64 {
    letters.bytes().fold(0u64, |acc, b| {
        acc.saturating_mul(26)
            .saturating_add((b.to_ascii_uppercase() - b'A') as u64 + 1)
    })
}

impl Ord for ColumnId {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_columns(&self.0, &other.0)
    }
}

impl PartialOrd for ColumnId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ColumnId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl AsRef<str> for ColumnId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Anything a caller may use to name a column: letters or a 1-based position.
pub trait IntoColumn {
    /// Resolve to a canonical [`ColumnId`]
    fn into_column(self) -> Result<ColumnId>;
}

impl IntoColumn for ColumnId {
    fn into_column(self) -> Result<ColumnId> {
        Ok(self)
    }
}

impl IntoColumn for &ColumnId {
    fn into_column(self) -> Result<ColumnId> {
        Ok(self.clone())
    }
}

impl IntoColumn for &str {
    fn into_column(self) -> Result<ColumnId> {
        ColumnId::parse(self)
    }
}

impl IntoColumn for String {
    fn into_column(self) -> Result<ColumnId> {
        ColumnId::parse(&self)
    }
}

impl IntoColumn for &String {
    fn into_column(self) -> Result<ColumnId> {
        ColumnId::parse(self)
    }
}

impl IntoColumn for u32 {
    fn into_column(self) -> Result<ColumnId> {
        ColumnId::from_position(self)
    }
}

impl IntoColumn for u16 {
    fn into_column(self) -> Result<ColumnId> {
        ColumnId::from_position(self as u32)
    }
}

impl IntoColumn for usize {
    fn into_column(self) -> Result<ColumnId> {
        let position = u32::try_from(self)
            .map_err(|_| Error::coordinate(format!("column {} is out of range", self)))?;
        ColumnId::from_position(position)
    }
}

impl IntoColumn for i32 {
    fn into_column(self) -> Result<ColumnId> {
        if self < 1 {
            return Err(Error::coordinate("column cannot be less than 1"));
        }
        ColumnId::from_position(self as u32)
    }
}

impl IntoColumn for i64 {
    fn into_column(self) -> Result<ColumnId> {
        if self < 1 {
            return Err(Error::coordinate("column cannot be less than 1"));
        }
        let position = u32::try_from(self)
            .map_err(|_| Error::coordinate(format!("column {} is out of range", self)))?;
        ColumnId::from_position(position)
    }
}
