//! Cell value types

use crate::error::{Error, Result};
use std::fmt;

/// A value to write into a cell
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum CellValue {
    /// Numeric value
    Number(f64),

    /// Text value
    String(String),
}

impl CellValue {
    /// Create a new string value
    pub fn string<S: Into<String>>(s: S) -> Self {
        CellValue::String(s.into())
    }

    /// Check if the value is textual
    pub fn is_string(&self) -> bool {
        matches!(self, CellValue::String(_))
    }

    /// Get as number if numeric
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::String(_) => None,
        }
    }

    /// Get as string if textual
    pub fn as_string(&self) -> Option<&str> {
        match self {
            CellValue::String(s) => Some(s),
            CellValue::Number(_) => None,
        }
    }

    /// The literal text stored in the worksheet for this value
    ///
    /// Numbers use the shortest representation that round-trips, so `500.0`
    /// becomes `500`.
    pub fn to_literal(&self) -> String {
        match self {
            CellValue::Number(n) => n.to_string(),
            CellValue::String(s) => s.clone(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::String(s) => f.write_str(s),
        }
    }
}

impl From<i32> for CellValue {
    fn from(n: i32) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<u32> for CellValue {
    fn from(n: u32) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_owned())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

impl From<&String> for CellValue {
    fn from(s: &String) -> Self {
        CellValue::String(s.clone())
    }
}

/// How a written value is represented in the cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum CellType {
    /// Inline string (`t="inlineStr"`)
    String,
    /// Number (`t="n"`)
    Number,
}

impl CellType {
    /// Infer the type of a value: text is a string, anything else a number
    pub fn infer(value: &CellValue) -> Self {
        match value {
            CellValue::String(_) => CellType::String,
            CellValue::Number(_) => CellType::Number,
        }
    }

    /// Name used in edit files and messages
    pub fn as_str(&self) -> &'static str {
        match self {
            CellType::String => "string",
            CellType::Number => "number",
        }
    }
}

impl fmt::Display for CellType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CellType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "string" => Ok(CellType::String),
            "number" => Ok(CellType::Number),
            other => Err(Error::InvalidValue(format!("unknown cell type '{}'", other))),
        }
    }
}

/// A pending write: the value and the type it will be stored as
#[derive(Debug, Clone, PartialEq)]
pub struct CellEdit {
    pub value: CellValue,
    pub cell_type: CellType,
}

impl CellEdit {
    /// Pair a value with its declared type, inferring one when `cell_type` is `None`.
    ///
    /// Non-finite numbers have no literal form in a worksheet and are rejected.
    /// Text declared as a number must read as a finite number; it is stored as
    /// the parsed number.
    pub fn new(value: CellValue, cell_type: Option<CellType>) -> Result<Self> {
        let value = match (value, cell_type) {
            (CellValue::String(s), Some(CellType::Number)) => match s.trim().parse::<f64>() {
                Ok(n) if n.is_finite() => CellValue::Number(n),
                _ => {
                    return Err(Error::InvalidValue(format!(
                        "'{}' is not a number",
                        s
                    )))
                }
            },
            (value, _) => value,
        };
        if let CellValue::Number(n) = value {
            if !n.is_finite() {
                return Err(Error::InvalidValue(format!(
                    "{} cannot be stored in a cell",
                    n
                )));
            }
        }
        let cell_type = cell_type.unwrap_or_else(|| CellType::infer(&value));
        Ok(Self { value, cell_type })
    }
}
