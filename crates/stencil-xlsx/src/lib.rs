//! # stencil-xlsx
//!
//! XLSX template patching for stencil.
//!
//! A template is opened once and kept in memory. Saving merges a set of
//! [`PendingEdits`](stencil_core::PendingEdits) into each worksheet's row tree
//! and repacks the archive, copying every part the merge does not rewrite.

pub mod error;
pub mod materialize;
pub mod merge;
pub mod package;
pub mod reader;
pub mod tree;
pub mod worksheet;
pub mod writer;

pub use error::{XlsxError, XlsxResult};
pub use merge::MergeStats;
pub use package::Package;
pub use reader::{SheetInfo, SheetTable};
pub use worksheet::WorksheetTree;
pub use writer::{Compression, SaveOptions, SaveStats, XlsxTemplate};
