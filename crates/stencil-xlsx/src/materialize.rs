//! Writing edits into `<c>` cell elements

use stencil_core::{CellEdit, CellType};

use crate::error::{XlsxError, XlsxResult};
use crate::tree::Element;

/// Write an edit into a cell element, replacing whatever it held before.
///
/// - A shared-string cell (`t="s"`) loses the index held in its `<v>`. The
///   shared-string table itself is left alone and may keep the orphaned entry.
/// - Numbers become `t="n"` with the literal numeral in `<v>`.
/// - Text becomes `t="inlineStr"` with the escaped text in `<is><t>`, reusing an
///   existing `<is>` slot. Text never goes into the shared-string table.
/// - A formula on the cell is dropped along with its cached value.
///
/// Style (`s`) and any other attributes are kept. Returns `true` when a formula
/// was removed.
///
/// The master of a shared formula (`<f t="shared" ref="..">` spanning more than
/// its own cell) holds the formula text its dependents borrow. Writing over it
/// is refused with [`XlsxError::MalformedTemplate`] and the cell is left as it was.
pub fn materialize(cell: &mut Element, edit: &CellEdit) -> XlsxResult<bool> {
    if let Some(range) = cell.child("f").and_then(shared_formula_range) {
        return Err(XlsxError::malformed(format!(
            "cell {} holds the shared formula for {} and cannot be overwritten",
            cell.attribute("r").unwrap_or("?"),
            range
        )));
    }
    let formula_removed = cell.remove_children("f") > 0;
    let literal = edit.value.to_literal();

    match edit.cell_type {
        CellType::Number => {
            cell.remove_children("is");
            cell.set_attribute("t", "n");
            cell.child_or_insert("v", &["is", "extLst"])
                .set_text(&literal);
        }
        CellType::String => {
            cell.remove_children("v");
            cell.set_attribute("t", "inlineStr");
            let inline = cell.child_or_insert("is", &["extLst"]);
            // Rich-text runs and phonetic hints belong to the old text
            inline.children.clear();
            let t = inline.child_or_insert("t", &[]);
            if literal.starts_with(char::is_whitespace) || literal.ends_with(char::is_whitespace) {
                t.set_attribute("xml:space", "preserve");
            }
            t.set_text(&literal);
        }
    }
    Ok(formula_removed)
}

/// The `ref` range of a shared formula master whose range covers other cells
fn shared_formula_range(f: &Element) -> Option<&str> {
    if f.attribute("t") != Some("shared") {
        return None;
    }
    let range = f.attribute("ref")?.trim();
    match range.split_once(':') {
        Some((first, last)) if !first.eq_ignore_ascii_case(last) => Some(range),
        _ => None,
    }
}

/// Drop the cached result of a formula cell so the consumer recalculates it.
///
/// Returns `true` when a cached value was removed. Cells without `<f>` are left
/// untouched.
pub fn clear_formula_cache(cell: &mut Element) -> bool {
    if !cell.has_child("f") {
        return false;
    }
    cell.remove_children("v") > 0
}
