//! # stencil-core
//!
//! Core types for the stencil template filler.
//!
//! - [`ColumnId`] and [`compare_columns`] - column identifiers and their total order
//! - [`CellRef`] - an A1-style cell reference
//! - [`CellValue`], [`CellType`] and [`CellEdit`] - what gets written into a cell
//! - [`PendingEdits`] - the sparse, always-sorted set of edits waiting for a save
//!
//! ## Example
//!
//! ```rust
//! use stencil_core::{CellType, PendingEdits};
//!
//! let mut edits = PendingEdits::new();
//! edits.set(0, 2, "B", 500, None).unwrap();
//! edits.fill_range(0, "E", 2, ["1/10", "2/10"], None).unwrap();
//!
//! let rows: Vec<u32> = edits.iter_sheet(0).map(|(row, _)| row).collect();
//! assert_eq!(rows, vec![2, 3]);
//!
//! let edit = edits.get(0, 2, "B").unwrap();
//! assert_eq!(edit.cell_type, CellType::Number);
//! ```

pub mod cell;
pub mod column;
pub mod edits;
pub mod error;

pub use cell::{CellEdit, CellRef, CellType, CellValue};
pub use column::{compare_columns, ColumnId, IntoColumn};
pub use edits::{PendingEdits, RowEdits, SheetEdits, SheetKey};
pub use error::{Error, Result};

/// Maximum number of rows in a worksheet (Excel limit)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet (Excel limit)
pub const MAX_COLS: u32 = 16_384;
