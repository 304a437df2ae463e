//! Worksheet row tree
//!
//! Wraps a parsed worksheet part and gives the merge access to its
//! `<sheetData>` element, the ordered sequence of `<row>` elements.

use crate::error::{XlsxError, XlsxResult};
use crate::tree::{Element, XmlDocument};

/// A worksheet part loaded for patching
#[derive(Debug, Clone)]
pub struct WorksheetTree {
    document: XmlDocument,
}

impl WorksheetTree {
    /// Parse a worksheet part
    pub fn parse(bytes: &[u8]) -> XlsxResult<Self> {
        let document = XmlDocument::parse(bytes)?;
        if document.root.local_name() != "worksheet" {
            return Err(XlsxError::malformed(format!(
                "expected a worksheet root element, found <{}>",
                document.root.name()
            )));
        }
        Ok(Self { document })
    }

    /// The `<sheetData>` element
    pub fn sheet_data(&self) -> XlsxResult<&Element> {
        self.document
            .root
            .child("sheetData")
            .ok_or_else(|| XlsxError::malformed("worksheet has no <sheetData> element"))
    }

    /// The `<sheetData>` element, mutably
    pub fn sheet_data_mut(&mut self) -> XlsxResult<&mut Element> {
        self.document
            .root
            .child_mut("sheetData")
            .ok_or_else(|| XlsxError::malformed("worksheet has no <sheetData> element"))
    }

    /// Row elements in document order
    pub fn rows(&self) -> XlsxResult<impl Iterator<Item = &Element> + '_> {
        Ok(self
            .sheet_data()?
            .elements()
            .filter(|el| el.local_name() == "row"))
    }

    /// Serialize the worksheet back to XML
    pub fn to_bytes(&self) -> XlsxResult<Vec<u8>> {
        self.document.to_bytes()
    }
}
