//! Pending-edit store
//!
//! Edits are kept in ordered maps at every level: sheet, then row (ascending),
//! then column (ascending per [`compare_columns`](crate::compare_columns)). The
//! merge that consumes them walks each level once, so the order must hold after
//! every insert rather than being established at save time.

use std::collections::btree_map;
use std::collections::BTreeMap;

use crate::cell::{CellEdit, CellType, CellValue};
use crate::column::{ColumnId, IntoColumn};
use crate::error::{Error, Result};
use crate::MAX_ROWS;

/// Sheet key used by the store: the 0-based position of the sheet in the
/// workbook's sheet table.
pub type SheetKey = usize;

/// All edits waiting to be applied, keyed by sheet, row and column
#[derive(Debug, Clone, Default)]
pub struct PendingEdits {
    sheets: BTreeMap<SheetKey, SheetEdits>,
}

/// Edits for a single sheet, rows ascending
#[derive(Debug, Clone, Default)]
pub struct SheetEdits {
    rows: BTreeMap<u32, RowEdits>,
}

/// Edits for a single row, columns ascending
#[derive(Debug, Clone, Default)]
pub struct RowEdits {
    cells: BTreeMap<ColumnId, CellEdit>,
}

impl PendingEdits {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an edit, replacing any earlier edit of the same cell.
    ///
    /// `row` is 1-based; `column` may be letters or a 1-based position. Nothing
    /// is stored when the coordinate or the value is rejected.
    pub fn set<C, V>(
        &mut self,
        sheet: SheetKey,
        row: u32,
        column: C,
        value: V,
        cell_type: Option<CellType>,
    ) -> Result<()>
    where
        C: IntoColumn,
        V: Into<CellValue>,
    {
        let row = check_row(row)?;
        let column = column.into_column()?;
        let edit = CellEdit::new(value.into(), cell_type)?;
        self.insert(sheet, row, column, edit);
        Ok(())
    }

    /// Write `values` down one column, starting at `starting_row`.
    ///
    /// Equivalent to calling [`set`](Self::set) once per value in input order.
    /// A failure part-way leaves the earlier values recorded.
    pub fn fill_range<C, I, V>(
        &mut self,
        sheet: SheetKey,
        column: C,
        starting_row: u32,
        values: I,
        cell_type: Option<CellType>,
    ) -> Result<()>
    where
        C: IntoColumn,
        I: IntoIterator<Item = V>,
        V: Into<CellValue>,
    {
        let mut values = values.into_iter().peekable();
        if values.peek().is_none() {
            return Ok(());
        }

        let column = column.into_column()?;
        let mut row = starting_row;
        for (offset, value) in values.enumerate() {
            if offset > 0 {
                row = row.checked_add(1).ok_or_else(|| {
                    Error::InvalidCoordinate(format!("row past {} while filling", u32::MAX))
                })?;
            }
            self.set(sheet, row, &column, value, cell_type)?;
        }
        Ok(())
    }

    /// Iterate a sheet's edits: rows ascending, each with its column-ordered edits.
    ///
    /// A sheet without edits yields nothing.
    pub fn iter_sheet(&self, sheet: SheetKey) -> impl Iterator<Item = (u32, &RowEdits)> + '_ {
        self.sheets
            .get(&sheet)
            .into_iter()
            .flat_map(|edits| edits.rows.iter().map(|(row, cells)| (*row, cells)))
    }

    /// Sheets with edits, keys ascending
    pub fn sheets(&self) -> btree_map::Iter<'_, SheetKey, SheetEdits> {
        self.sheets.iter()
    }

    /// The edits recorded for a sheet, if any
    pub fn sheet(&self, sheet: SheetKey) -> Option<&SheetEdits> {
        self.sheets.get(&sheet)
    }

    /// Look up the edit for a single cell
    pub fn get<C: IntoColumn>(&self, sheet: SheetKey, row: u32, column: C) -> Option<&CellEdit> {
        let column = column.into_column().ok()?;
        self.sheets.get(&sheet)?.rows.get(&row)?.cells.get(&column)
    }

    /// Total number of pending cell edits
    pub fn len(&self) -> usize {
        self.sheets.values().map(SheetEdits::len).sum()
    }

    /// Returns `true` if there are no pending edits
    pub fn is_empty(&self) -> bool {
        self.sheets.values().all(SheetEdits::is_empty)
    }

    /// Drop every pending edit
    pub fn clear(&mut self) {
        self.sheets.clear();
    }

    fn insert(&mut self, sheet: SheetKey, row: u32, column: ColumnId, edit: CellEdit) {
        self.sheets
            .entry(sheet)
            .or_default()
            .rows
            .entry(row)
            .or_default()
            .cells
            .insert(column, edit);
    }
}

impl SheetEdits {
    /// Rows ascending, each with its edits
    pub fn rows(&self) -> btree_map::Iter<'_, u32, RowEdits> {
        self.rows.iter()
    }

    /// Number of cell edits on this sheet
    pub fn len(&self) -> usize {
        self.rows.values().map(RowEdits::len).sum()
    }

    /// Returns `true` if there are no edits on this sheet
    pub fn is_empty(&self) -> bool {
        self.rows.values().all(RowEdits::is_empty)
    }
}

impl RowEdits {
    /// Edits in column order
    pub fn iter(&self) -> btree_map::Iter<'_, ColumnId, CellEdit> {
        self.cells.iter()
    }

    /// Number of edits in this row
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns `true` if this row has no edits
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl<'a> IntoIterator for &'a RowEdits {
    type Item = (&'a ColumnId, &'a CellEdit);
    type IntoIter = btree_map::Iter<'a, ColumnId, CellEdit>;

    fn into_iter(self) -> Self::IntoIter {
        self.cells.iter()
    }
}

fn check_row(row: u32) -> Result<u32> {
    if row < 1 {
        return Err(Error::InvalidCoordinate("row cannot be less than 1".into()));
    }
    if row > MAX_ROWS {
        return Err(Error::InvalidCoordinate(format!(
            "row {} is past the last row ({})",
            row, MAX_ROWS
        )));
    }
    Ok(row)
}
