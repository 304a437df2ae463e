//! Error types for stencil-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in stencil-core
#[derive(Debug, Error)]
pub enum Error {
    /// Row or column resolved outside the worksheet grid
    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),

    /// A cell reference such as `B2` could not be parsed
    #[error("Invalid cell reference: {0}")]
    InvalidReference(String),

    /// Sheet not found by name
    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    /// A value that cannot be stored in a cell
    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

impl Error {
    pub(crate) fn coordinate<S: Into<String>>(msg: S) -> Self {
        Error::InvalidCoordinate(msg.into())
    }
}
