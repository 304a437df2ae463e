//! XLSX error types

use thiserror::Error;

/// Result type for XLSX operations
pub type XlsxResult<T> = std::result::Result<T, XlsxError>;

/// Errors that can occur while reading a template or writing the patched copy
#[derive(Debug, Error)]
pub enum XlsxError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP error
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// XML error
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Malformed XML attribute
    #[error("XML attribute error: {0}")]
    XmlAttribute(#[from] quick_xml::events::attributes::AttrError),

    /// Malformed XML escape sequence
    #[error("XML escape error: {0}")]
    XmlEscape(#[from] quick_xml::escape::EscapeError),

    /// Missing required part
    #[error("Missing required part: {0}")]
    MissingPart(String),

    /// The template lacks a structure the merge depends on
    #[error("Malformed template: {0}")]
    MalformedTemplate(String),

    /// Core error (sheet lookup, coordinates)
    #[error(transparent)]
    Core(#[from] stencil_core::Error),
}

impl XlsxError {
    /// Whether this error came from reading or writing the container itself
    /// (archive, file system or XML encoding) rather than from the caller's input
    /// or the template's structure.
    pub fn is_container_io(&self) -> bool {
        matches!(
            self,
            XlsxError::Io(_)
                | XlsxError::Zip(_)
                | XlsxError::Xml(_)
                | XlsxError::XmlAttribute(_)
                | XlsxError::XmlEscape(_)
        )
    }

    pub(crate) fn malformed<S: Into<String>>(msg: S) -> Self {
        XlsxError::MalformedTemplate(msg.into())
    }
}

impl From<std::string::FromUtf8Error> for XlsxError {
    fn from(e: std::string::FromUtf8Error) -> Self {
        XlsxError::MalformedTemplate(format!("part is not valid UTF-8: {}", e))
    }
}
