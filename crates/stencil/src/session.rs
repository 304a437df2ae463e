//! Template filling session
//!
//! A [`TemplateWriter`] owns an opened template, the currently selected sheet and
//! the edits recorded so far. Nothing touches the file system until a save.
//!
//! # Example
//!
//! ```rust,no_run
//! use stencil::prelude::*;
//!
//! let mut writer = TemplateWriter::open("template.xlsx")?;
//! writer.select_sheet("Demographics")?;
//! writer.write_cell("B", 2, 500, None)?;
//! writer.fill_column("E", 2, ["1/10", "2/10", "3/10"], None)?;
//! writer.save("filled.xlsx")?;
//! # Ok::<(), stencil::XlsxError>(())
//! ```

use std::io::{Read, Seek, Write};
use std::path::Path;

use log::debug;
use stencil_core::{CellType, CellValue, IntoColumn, PendingEdits, SheetKey};
use stencil_xlsx::{SaveOptions, SaveStats, SheetInfo, XlsxResult, XlsxTemplate};

/// Fills cell values into a copy of an XLSX template
#[derive(Debug, Clone)]
pub struct TemplateWriter {
    template: XlsxTemplate,
    edits: PendingEdits,
    selected: SheetKey,
}

impl TemplateWriter {
    /// Open a template file. The first sheet is selected.
    pub fn open<P: AsRef<Path>>(path: P) -> XlsxResult<Self> {
        Ok(Self::new(XlsxTemplate::open(path)?))
    }

    /// Open a template from its archive bytes. The first sheet is selected.
    pub fn open_from_bytes(bytes: Vec<u8>) -> XlsxResult<Self> {
        Ok(Self::new(XlsxTemplate::from_bytes(bytes)?))
    }

    /// Read a template from any reader. The first sheet is selected.
    pub fn from_reader<R: Read>(reader: R) -> XlsxResult<Self> {
        Ok(Self::new(XlsxTemplate::read(reader)?))
    }

    /// Start a session on an already opened template
    pub fn new(template: XlsxTemplate) -> Self {
        Self {
            template,
            edits: PendingEdits::new(),
            selected: 0,
        }
    }

    /// Select the sheet later writes go to.
    ///
    /// The name is matched ignoring case and surrounding whitespace. On failure
    /// the previous selection stays.
    pub fn select_sheet(&mut self, name: &str) -> XlsxResult<()> {
        let sheet = self.template.sheets().resolve(name)?;
        debug!("selected sheet \"{}\" (#{})", sheet.name, sheet.index + 1);
        self.selected = sheet.index;
        Ok(())
    }

    /// The currently selected sheet
    pub fn selected_sheet(&self) -> Option<&SheetInfo> {
        self.template.sheets().get(self.selected)
    }

    /// Record a value for one cell of the selected sheet.
    ///
    /// `column` is letters (`"B"`, `"ab"`) or a 1-based position; `row` is
    /// 1-based. Without `cell_type` the type follows the value: text is stored
    /// as a string, numbers as numbers. A later write to the same cell wins.
    pub fn write_cell<C, V>(
        &mut self,
        column: C,
        row: u32,
        value: V,
        cell_type: Option<CellType>,
    ) -> XlsxResult<()>
    where
        C: IntoColumn,
        V: Into<CellValue>,
    {
        self.edits
            .set(self.selected, row, column, value, cell_type)?;
        Ok(())
    }

    /// Record `values` down one column of the selected sheet, starting at
    /// `starting_row`. Values written before a failing one stay recorded.
    pub fn fill_column<C, I, V>(
        &mut self,
        column: C,
        starting_row: u32,
        values: I,
        cell_type: Option<CellType>,
    ) -> XlsxResult<()>
    where
        C: IntoColumn,
        I: IntoIterator<Item = V>,
        V: Into<CellValue>,
    {
        self.edits
            .fill_range(self.selected, column, starting_row, values, cell_type)?;
        Ok(())
    }

    /// Save the filled template to `path` with default options.
    ///
    /// The recorded edits are kept, so saving again produces the same file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> XlsxResult<SaveStats> {
        self.save_with_options(path, &SaveOptions::default())
    }

    /// Save the filled template to `path`
    pub fn save_with_options<P: AsRef<Path>>(
        &self,
        path: P,
        options: &SaveOptions,
    ) -> XlsxResult<SaveStats> {
        self.template.save(&self.edits, path, options)
    }

    /// Write the filled template to `writer` with default options
    pub fn save_to_writer<W: Write + Seek>(&self, writer: W) -> XlsxResult<W> {
        let (writer, _) = self
            .template
            .write(&self.edits, writer, &SaveOptions::default())?;
        Ok(writer)
    }

    /// Write the filled template to `writer`
    pub fn save_to_writer_with_options<W: Write + Seek>(
        &self,
        writer: W,
        options: &SaveOptions,
    ) -> XlsxResult<(W, SaveStats)> {
        self.template.write(&self.edits, writer, options)
    }

    /// Sheet names in workbook order
    pub fn sheet_names(&self) -> Vec<&str> {
        self.template
            .sheets()
            .iter()
            .map(|sheet| sheet.name.as_str())
            .collect()
    }

    /// The edits recorded so far
    pub fn pending(&self) -> &PendingEdits {
        &self.edits
    }

    /// Forget every recorded edit
    pub fn clear(&mut self) {
        self.edits.clear();
    }

    /// The opened template
    pub fn template(&self) -> &XlsxTemplate {
        &self.template
    }
}
