//! Cell-related types
//!
//! This module contains:
//! - [`CellValue`] - The value a caller wants written into a cell
//! - [`CellType`] - How that value is represented in the worksheet
//! - [`CellEdit`] - A value paired with its declared or inferred type
//! - [`CellRef`] - A cell's location (e.g., "B2")

mod address;
mod value;

pub use address::CellRef;
pub use value::{CellEdit, CellType, CellValue};
