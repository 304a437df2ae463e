//! # stencil
//!
//! Fill cell values into an existing XLSX template.
//!
//! The template's styles, formulas, other sheets and every unrelated part of
//! the package are kept. Only the cells you write change; text is stored as
//! inline strings and formula results cached in the template are dropped so the
//! spreadsheet application recalculates them.
//!
//! ## Example
//!
//! ```rust,no_run
//! use stencil::prelude::*;
//!
//! let mut writer = TemplateWriter::open("report-template.xlsx")?;
//! writer.select_sheet("Demographics")?;
//!
//! // Letters or 1-based positions
//! writer.write_cell("B", 2, 500, None)?;
//! writer.write_cell(28, 2, "AB2", None)?;
//!
//! // Keep leading zeros by storing a string
//! writer.write_cell("C", 2, "007", Some(CellType::String))?;
//!
//! writer.fill_column("E", 2, ["1/10", "2/10", "3/10"], None)?;
//!
//! let options = SaveOptions::new().with_full_calc_on_load(true);
//! writer.save_with_options("report.xlsx", &options)?;
//! # Ok::<(), XlsxError>(())
//! ```

pub mod prelude;
pub mod session;

pub use session::TemplateWriter;

// Re-export core types
pub use stencil_core::{
    compare_columns, CellEdit, CellRef, CellType, CellValue, ColumnId, Error, IntoColumn,
    PendingEdits, Result, MAX_COLS, MAX_ROWS,
};

// Re-export XLSX types
pub use stencil_xlsx::{
    Compression, MergeStats, Package, SaveOptions, SaveStats, SheetInfo, SheetTable,
    WorksheetTree, XlsxError, XlsxResult, XlsxTemplate,
};
