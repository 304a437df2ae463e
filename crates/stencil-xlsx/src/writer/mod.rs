//! Template writer
//!
//! Applies pending edits to a copy of the template. Every save starts from the
//! pristine template bytes, merges every worksheet (edited or not, so formula
//! caches are cleared everywhere), and repacks the archive with the rewritten
//! parts.

mod calc_chain;

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::{BufReader, Read, Seek, Write};
use std::path::Path;

use log::{debug, info};
use stencil_core::PendingEdits;
use zip::CompressionMethod;

use crate::error::{XlsxError, XlsxResult};
use crate::merge::{merge_sheet_data, MergeStats};
use crate::package::Package;
use crate::reader::{SheetInfo, SheetTable, WORKBOOK_PART};
use crate::tree::XmlDocument;
use crate::worksheet::WorksheetTree;

use self::calc_chain::remove_calc_chain;

/// Compression applied to the parts a save rewrites
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Compression {
    /// Deflate (the default, what spreadsheet applications write)
    #[default]
    Deflated,
    /// No compression
    Stored,
}

impl From<Compression> for CompressionMethod {
    fn from(c: Compression) -> Self {
        match c {
            Compression::Deflated => CompressionMethod::Deflated,
            Compression::Stored => CompressionMethod::Stored,
        }
    }
}

/// Options for saving a filled template
#[derive(Debug, Clone, Default)]
pub struct SaveOptions {
    /// Compression for rewritten parts. Untouched parts keep their own.
    pub compression: Compression,
    /// Ask the consumer to recalculate every formula when the file is opened
    pub full_calc_on_load: bool,
}

impl SaveOptions {
    /// Create default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the compression for rewritten parts
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Set `fullCalcOnLoad` on the saved workbook
    pub fn with_full_calc_on_load(mut self, enabled: bool) -> Self {
        self.full_calc_on_load = enabled;
        self
    }
}

/// Summary of a save
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveStats {
    /// Worksheets merged and rewritten
    pub sheets_rewritten: usize,
    /// Counts summed over every worksheet
    pub merge: MergeStats,
}

/// An XLSX template opened for filling
#[derive(Debug, Clone)]
pub struct XlsxTemplate {
    package: Package,
    sheets: SheetTable,
}

impl XlsxTemplate {
    /// Open a template file
    pub fn open<P: AsRef<Path>>(path: P) -> XlsxResult<Self> {
        Self::from_package(Package::open(path)?)
    }

    /// Open a template from its archive bytes
    pub fn from_bytes(bytes: Vec<u8>) -> XlsxResult<Self> {
        Self::from_package(Package::from_bytes(bytes)?)
    }

    /// Read a template from any reader
    pub fn read<R: Read>(reader: R) -> XlsxResult<Self> {
        let mut bytes = Vec::new();
        BufReader::new(reader).read_to_end(&mut bytes)?;
        Self::from_bytes(bytes)
    }

    fn from_package(package: Package) -> XlsxResult<Self> {
        let sheets = SheetTable::read(&package)?;
        Ok(Self { package, sheets })
    }

    /// The workbook's sheet table
    pub fn sheets(&self) -> &SheetTable {
        &self.sheets
    }

    /// The underlying package
    pub fn package(&self) -> &Package {
        &self.package
    }

    /// Apply `edits` and write the resulting archive to `writer`.
    ///
    /// Sheets are keyed by their position in [`sheets`](Self::sheets). Every part
    /// is rendered before the first byte is written, so a merge failure leaves
    /// the writer untouched.
    pub fn write<W: Write + Seek>(
        &self,
        edits: &PendingEdits,
        writer: W,
        options: &SaveOptions,
    ) -> XlsxResult<(W, SaveStats)> {
        let rendered = self.render(edits, options)?;
        let writer = self.package.repack_without(
            writer,
            &rendered.replacements,
            &rendered.removed,
            options.compression.into(),
        )?;
        let stats = rendered.stats;
        info!(
            "filled {} cell(s) across {} sheet(s)",
            stats.merge.cells_inserted + stats.merge.cells_updated,
            stats.sheets_rewritten
        );
        Ok((writer, stats))
    }

    /// Apply `edits` and save the result to `path`.
    ///
    /// The archive is written to a temporary file next to `path` and moved into
    /// place only once complete; on error `path` is left as it was.
    ///
    /// A replaced file keeps its permissions. A new file gets the permissions a
    /// plain file creation would give it (`0o666` less the umask on Unix).
    pub fn save<P: AsRef<Path>>(
        &self,
        edits: &PendingEdits,
        path: P,
        options: &SaveOptions,
    ) -> XlsxResult<SaveStats> {
        let path = path.as_ref();
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };

        let mut builder = tempfile::Builder::new();
        builder.prefix(".stencil").suffix(".tmp");
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            // Masked by the umask at creation, like `File::create`
            builder.permissions(fs::Permissions::from_mode(0o666));
        }
        let temp = builder.tempfile_in(dir)?;
        if let Ok(existing) = fs::metadata(path) {
            temp.as_file().set_permissions(existing.permissions())?;
        }

        let (file, stats) = self.write(edits, temp.reopen()?, options)?;
        file.sync_all()?;
        drop(file);

        temp.persist(path).map_err(|e| XlsxError::Io(e.error))?;
        debug!("saved {}", path.display());
        Ok(stats)
    }

    /// Merge every sheet and collect the rewritten and dropped parts
    fn render(&self, edits: &PendingEdits, options: &SaveOptions) -> XlsxResult<Rendered> {
        let mut replacements = HashMap::new();
        let mut removed = HashSet::new();
        let mut stats = SaveStats::default();

        if let Some(unknown) = edits_for_unknown_sheet(edits, self.sheets.len()) {
            return Err(XlsxError::Core(stencil_core::Error::SheetNotFound(format!(
                "sheet #{}",
                unknown + 1
            ))));
        }

        for sheet in &self.sheets {
            let Some(part) = sheet.part.as_deref() else {
                if edits.sheet(sheet.index).is_some_and(|s| !s.is_empty()) {
                    return Err(XlsxError::malformed(format!(
                        "sheet \"{}\" has no worksheet part to write cells into",
                        sheet.name
                    )));
                }
                continue;
            };

            let (bytes, sheet_stats) = self.merge_sheet(sheet, part, edits)?;
            debug!(
                "sheet \"{}\": {} row(s) inserted, {} cell(s) inserted, {} updated, {} formula cache(s) cleared, {} formula(s) removed",
                sheet.name,
                sheet_stats.rows_inserted,
                sheet_stats.cells_inserted,
                sheet_stats.cells_updated,
                sheet_stats.formula_caches_cleared,
                sheet_stats.formulas_removed
            );
            stats.merge.accumulate(&sheet_stats);
            stats.sheets_rewritten += 1;
            replacements.insert(part.to_owned(), bytes);
        }

        if options.full_calc_on_load {
            let workbook = self.package.read_part(WORKBOOK_PART)?;
            replacements.insert(WORKBOOK_PART.to_owned(), set_full_calc_on_load(&workbook)?);
        }

        // The chain would still list the cells that lost their formula
        if stats.merge.formulas_removed > 0 {
            if let Some(removal) = remove_calc_chain(&self.package)? {
                replacements.extend(removal.rewritten);
                removed.extend(removal.removed);
            }
        }

        Ok(Rendered {
            replacements,
            removed,
            stats,
        })
    }

    fn merge_sheet(
        &self,
        sheet: &SheetInfo,
        part: &str,
        edits: &PendingEdits,
    ) -> XlsxResult<(Vec<u8>, MergeStats)> {
        let mut tree = WorksheetTree::parse(&self.package.read_part(part)?)?;
        let stats = merge_sheet_data(tree.sheet_data_mut()?, edits.iter_sheet(sheet.index))?;
        Ok((tree.to_bytes()?, stats))
    }
}

/// The parts a save rewrites or leaves out
struct Rendered {
    replacements: HashMap<String, Vec<u8>>,
    removed: HashSet<String>,
    stats: SaveStats,
}

/// First sheet key with edits that the workbook does not have
fn edits_for_unknown_sheet(edits: &PendingEdits, sheet_count: usize) -> Option<usize> {
    edits
        .sheets()
        .filter(|(_, sheet)| !sheet.is_empty())
        .map(|(key, _)| *key)
        .find(|key| *key >= sheet_count)
}

/// Elements that follow `<calcPr>` in a workbook, in schema order
const AFTER_CALC_PR: &[&str] = &[
    "oleSize",
    "customWorkbookViews",
    "pivotCaches",
    "smartTagPr",
    "smartTagTypes",
    "webPublishing",
    "fileRecoveryPr",
    "webPublishObjects",
    "extLst",
];

/// Set `fullCalcOnLoad="1"` on the workbook's `<calcPr>`, inserting it when missing
fn set_full_calc_on_load(workbook: &[u8]) -> XlsxResult<Vec<u8>> {
    let mut document = XmlDocument::parse(workbook)?;
    document
        .root
        .child_or_insert("calcPr", AFTER_CALC_PR)
        .set_attribute("fullCalcOnLoad", "1");
    document.to_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn full_calc(xml: &str) -> String {
        String::from_utf8(set_full_calc_on_load(xml.as_bytes()).unwrap()).unwrap()
    }

    #[test]
    fn test_full_calc_inserted_before_ext_lst() {
        assert_eq!(
            full_calc(r#"<workbook><sheets></sheets><extLst></extLst></workbook>"#),
            r#"<workbook><sheets></sheets><calcPr fullCalcOnLoad="1"></calcPr><extLst></extLst></workbook>"#
        );
    }

    #[test]
    fn test_full_calc_appended() {
        assert_eq!(
            full_calc(r#"<workbook><sheets></sheets></workbook>"#),
            r#"<workbook><sheets></sheets><calcPr fullCalcOnLoad="1"></calcPr></workbook>"#
        );
    }

    #[test]
    fn test_full_calc_updates_existing() {
        assert_eq!(
            full_calc(r#"<workbook><calcPr calcId="191029" fullCalcOnLoad="0"/></workbook>"#),
            r#"<workbook><calcPr calcId="191029" fullCalcOnLoad="1"></calcPr></workbook>"#
        );
    }

    #[test]
    fn test_compression_mapping() {
        assert_eq!(CompressionMethod::from(Compression::default()), CompressionMethod::Deflated);
        assert_eq!(CompressionMethod::from(Compression::Stored), CompressionMethod::Stored);
    }

    #[test]
    fn test_edits_for_unknown_sheet() {
        let mut edits = PendingEdits::new();
        edits.set(1, 1, "A", 1, None).unwrap();
        assert_eq!(edits_for_unknown_sheet(&edits, 2), None);
        assert_eq!(edits_for_unknown_sheet(&edits, 1), Some(1));
    }
}
