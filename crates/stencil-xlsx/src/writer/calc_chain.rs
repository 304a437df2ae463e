//! Taking the calculation chain out of a package.
//!
//! `calcChain.xml` lists every formula cell in evaluation order. Once a write
//! removes a formula, the chain names a cell that no longer has one, and
//! spreadsheet applications report the file as damaged. The chain is optional,
//! so it is dropped together with its relationship and content-type override
//! and the application rebuilds it on the next calculation.

use log::debug;

use crate::error::XlsxResult;
use crate::package::{Package, CONTENT_TYPES};
use crate::reader::{resolve_target, WORKBOOK_RELS_PART};
use crate::tree::{Element, XmlDocument};

/// Where the chain lives when the relationships do not say
pub(crate) const CALC_CHAIN_PART: &str = "xl/calcChain.xml";

const CALC_CHAIN_REL_TYPE: &str = "/calcChain";

/// Parts to rewrite and the chain part to leave out
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct CalcChainRemoval {
    /// Rewritten relationship and content-type parts
    pub rewritten: Vec<(String, Vec<u8>)>,
    /// The chain part itself
    pub removed: Option<String>,
}

/// Work out how to drop the package's calc chain. Returns `None` when there is
/// no chain to drop.
pub(crate) fn remove_calc_chain(package: &Package) -> XlsxResult<Option<CalcChainRemoval>> {
    let mut removal = CalcChainRemoval::default();
    let mut part = None;

    if package.has_part(WORKBOOK_RELS_PART) {
        let mut rels = XmlDocument::parse(&package.read_part(WORKBOOK_RELS_PART)?)?;
        if let Some(target) = rels.root.elements().find_map(calc_chain_target) {
            part = Some(resolve_target("xl", &target));
        }
        if rels.root.remove_children_where(|el| calc_chain_target(el).is_some()) > 0 {
            removal
                .rewritten
                .push((WORKBOOK_RELS_PART.to_owned(), rels.to_bytes()?));
        }
    }

    let part = part.unwrap_or_else(|| CALC_CHAIN_PART.to_owned());
    if package.has_part(&part) {
        removal.removed = Some(part.clone());
    }

    let mut types = XmlDocument::parse(&package.read_part(CONTENT_TYPES)?)?;
    let removed = types.root.remove_children_where(|el| {
        el.local_name() == "Override"
            && el
                .attribute_value("PartName")
                .is_some_and(|name| name.trim_start_matches('/').eq_ignore_ascii_case(&part))
    });
    if removed > 0 {
        removal.rewritten.push((CONTENT_TYPES.to_owned(), types.to_bytes()?));
    }

    if removal.removed.is_none() && removal.rewritten.is_empty() {
        return Ok(None);
    }
    debug!("dropping calculation chain {}", part);
    Ok(Some(removal))
}

/// Target of a calc chain relationship
fn calc_chain_target(el: &Element) -> Option<String> {
    if el.local_name() != "Relationship" {
        return None;
    }
    let rel_type = el.attribute_value("Type")?;
    if !rel_type.ends_with(CALC_CHAIN_REL_TYPE) {
        return None;
    }
    el.attribute_value("Target").map(|t| t.into_owned())
}
