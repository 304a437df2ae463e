//! Prelude module - common imports for stencil users
//!
//! ```rust
//! use stencil::prelude::*;
//! ```

// Main types
pub use crate::TemplateWriter;

// Cell types
pub use crate::{CellType, CellValue, ColumnId, IntoColumn};

// Save options
pub use crate::{Compression, SaveOptions, SaveStats};

// Error types
pub use crate::{Error, Result, XlsxError, XlsxResult};
