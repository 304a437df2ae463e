//! Merging pending edits into a worksheet's row tree.
//!
//! Two nested sorted merges: rows of `<sheetData>` against the pending rows,
//! then, inside every row, cells against that row's pending columns. Each side is
//! walked once, new nodes go immediately before the first existing node with a
//! greater key, and every existing row and cell is visited exactly once so stale
//! formula results are cleared even on rows nobody edited.
//!
//! Rows and cells without an `r` attribute take the previous reference plus one,
//! as spreadsheet readers do. The merge writes that inferred reference onto the
//! node, so an inserted neighbour cannot shift its meaning.

use std::iter::Peekable;

use log::{trace, warn};
use stencil_core::{CellEdit, CellRef, ColumnId, RowEdits, MAX_ROWS};

use crate::error::XlsxResult;
use crate::materialize::{clear_formula_cache, materialize};
use crate::tree::{Element, Node};

/// What a merge did to one worksheet
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Rows created for edits that had no existing row
    pub rows_inserted: usize,
    /// Cells created for edits that had no existing cell
    pub cells_inserted: usize,
    /// Existing cells overwritten in place
    pub cells_updated: usize,
    /// Formula cells whose cached value was dropped
    pub formula_caches_cleared: usize,
    /// Formulas removed because a value was written over them
    pub formulas_removed: usize,
}

impl MergeStats {
    /// Add another sheet's counts to this one
    pub fn accumulate(&mut self, other: &MergeStats) {
        self.rows_inserted += other.rows_inserted;
        self.cells_inserted += other.cells_inserted;
        self.cells_updated += other.cells_updated;
        self.formula_caches_cleared += other.formula_caches_cleared;
        self.formulas_removed += other.formulas_removed;
    }
}

/// Merge a sheet's pending rows (ascending) into its `<sheetData>` element.
pub fn merge_sheet_data<'a, I>(sheet_data: &mut Element, pending: I) -> XlsxResult<MergeStats>
where
    I: IntoIterator<Item = (u32, &'a RowEdits)>,
{
    let mut stats = MergeStats::default();
    let row_name = sheet_data.sibling_name("row");
    let mut pending = pending.into_iter().peekable();
    let existing = std::mem::take(&mut sheet_data.children);
    let mut merged = Vec::with_capacity(existing.len());
    let mut previous_row = 0u32;

    for node in existing {
        let mut row = match node {
            Node::Element(el) if el.local_name() == "row" => el,
            other => {
                merged.push(other);
                continue;
            }
        };

        let Some(number) = row_number(&mut row, previous_row) else {
            // Position unknown: nothing can be merged into it, but its formula
            // caches are still stale. It still occupies a slot for the next
            // implicit row.
            stats.formula_caches_cleared += clear_row_caches(&mut row);
            merged.push(Node::Element(row));
            previous_row = previous_row.saturating_add(1);
            continue;
        };

        while let Some((new_number, edits)) = pending.next_if(|(n, _)| *n < number) {
            merged.push(Node::Element(new_row(&row_name, new_number, edits, &mut stats)?));
        }

        let edits = pending.next_if(|(n, _)| *n == number).map(|(_, edits)| edits);
        merge_row(&mut row, number, edits, &mut stats)?;
        merged.push(Node::Element(row));
        previous_row = number;
    }

    for (new_number, edits) in pending {
        merged.push(Node::Element(new_row(&row_name, new_number, edits, &mut stats)?));
    }

    sheet_data.children = merged;
    Ok(stats)
}

/// Merge one row's pending edits (columns ascending) into a `<row>` element.
///
/// `edits` may be `None`: the row's cells are still visited to clear formula
/// caches.
pub fn merge_row(
    row: &mut Element,
    row_number: u32,
    edits: Option<&RowEdits>,
    stats: &mut MergeStats,
) -> XlsxResult<()> {
    let cell_name = row.sibling_name("c");
    let mut pending: Peekable<_> = edits.into_iter().flat_map(RowEdits::iter).peekable();
    let existing = std::mem::take(&mut row.children);
    let mut merged = Vec::with_capacity(existing.len() + edits.map_or(0, RowEdits::len));
    let mut previous_column = 0u32;

    for node in existing {
        let mut cell = match node {
            Node::Element(el) if el.local_name() == "c" => el,
            other => {
                merged.push(other);
                continue;
            }
        };

        let Some(column) = cell_column(&mut cell, row_number, previous_column) else {
            if clear_formula_cache(&mut cell) {
                stats.formula_caches_cleared += 1;
            }
            merged.push(Node::Element(cell));
            previous_column = previous_column.saturating_add(1);
            continue;
        };

        while let Some((new_column, edit)) = pending.next_if(|(c, _)| **c < column) {
            merged.push(Node::Element(new_cell(&cell_name, new_column, row_number, edit)?));
            stats.cells_inserted += 1;
        }

        if let Some((_, edit)) = pending.next_if(|(c, _)| **c == column) {
            if materialize(&mut cell, edit)? {
                stats.formulas_removed += 1;
            }
            stats.cells_updated += 1;
        }
        if clear_formula_cache(&mut cell) {
            stats.formula_caches_cleared += 1;
        }

        previous_column = column.position();
        merged.push(Node::Element(cell));
    }

    for (new_column, edit) in pending {
        merged.push(Node::Element(new_cell(&cell_name, new_column, row_number, edit)?));
        stats.cells_inserted += 1;
    }

    row.children = merged;
    Ok(())
}

fn new_row(
    name: &str,
    number: u32,
    edits: &RowEdits,
    stats: &mut MergeStats,
) -> XlsxResult<Element> {
    trace!("inserting row {}", number);
    let mut row = Element::new(name);
    row.set_attribute("r", number.to_string());
    merge_row(&mut row, number, Some(edits), stats)?;
    stats.rows_inserted += 1;
    Ok(row)
}

fn new_cell(name: &str, column: &ColumnId, row: u32, edit: &CellEdit) -> XlsxResult<Element> {
    trace!("inserting cell {}{}", column, row);
    let mut cell = Element::new(name);
    cell.set_attribute("r", format!("{}{}", column, row));
    materialize(&mut cell, edit)?;
    Ok(cell)
}

/// The row's number, from `r` or inferred from the previous row.
fn row_number(row: &mut Element, previous: u32) -> Option<u32> {
    let explicit = row.attribute_value("r").map(|r| r.into_owned());
    match explicit {
        Some(r) => match r.trim().parse::<u32>() {
            Ok(n) if (1..=MAX_ROWS).contains(&n) => Some(n),
            _ => {
                warn!("skipping row with unusable reference r=\"{}\"", r);
                None
            }
        },
        None => {
            let inferred = previous.checked_add(1).filter(|n| *n <= MAX_ROWS)?;
            row.set_attribute("r", inferred.to_string());
            Some(inferred)
        }
    }
}

/// The cell's column, from `r` or inferred from the previous cell.
fn cell_column(cell: &mut Element, row_number: u32, previous: u32) -> Option<ColumnId> {
    let explicit = cell.attribute_value("r").map(|r| r.into_owned());
    match explicit {
        Some(r) => match CellRef::parse(&r) {
            Ok(cell_ref) => {
                if cell_ref.row != row_number {
                    warn!("cell {} sits in row {}", cell_ref, row_number);
                }
                Some(cell_ref.column)
            }
            Err(e) => {
                warn!("skipping cell with unusable reference: {}", e);
                None
            }
        },
        None => {
            let column = ColumnId::from_position(previous.checked_add(1)?).ok()?;
            cell.set_attribute("r", format!("{}{}", column, row_number));
            Some(column)
        }
    }
}

fn clear_row_caches(row: &mut Element) -> usize {
    row.children
        .iter_mut()
        .filter_map(|node| match node {
            Node::Element(el) if el.local_name() == "c" => Some(el),
            _ => None,
        })
        .map(clear_formula_cache)
        .filter(|cleared| *cleared)
        .count()
}
