//! Workbook sheet table
//!
//! Reads the sheet list from `xl/workbook.xml` and resolves each sheet to its
//! part through `xl/_rels/workbook.xml.rels`.

use std::collections::HashMap;

use log::{debug, warn};
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use stencil_core::Error as CoreError;

use crate::error::{XlsxError, XlsxResult};
use crate::package::Package;

pub(crate) const WORKBOOK_PART: &str = "xl/workbook.xml";
pub(crate) const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";

/// A sheet listed in the workbook
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetInfo {
    /// Name as shown on the sheet tab
    pub name: String,
    /// 0-based position in the workbook's sheet list
    pub index: usize,
    /// Worksheet part holding the cells. `None` for sheets without a row tree,
    /// such as chartsheets.
    pub part: Option<String>,
}

/// Ordered sheet list with name lookup
#[derive(Debug, Clone, Default)]
pub struct SheetTable {
    sheets: Vec<SheetInfo>,
    by_name: HashMap<String, usize>,
}

/// Relationship target resolved to a part name, with whether it is a worksheet
struct Relationship {
    part: String,
    is_worksheet: bool,
}

impl SheetTable {
    /// Read the sheet table of a package
    pub fn read(package: &Package) -> XlsxResult<Self> {
        let entries = read_workbook_xml(&package.read_part(WORKBOOK_PART)?)?;
        let rels = if package.has_part(WORKBOOK_RELS_PART) {
            read_workbook_rels(&package.read_part(WORKBOOK_RELS_PART)?)?
        } else {
            warn!("{} is missing, guessing worksheet parts", WORKBOOK_RELS_PART);
            HashMap::new()
        };

        let sheets = entries
            .into_iter()
            .enumerate()
            .map(|(index, (name, r_id))| {
                let part = match r_id.as_deref().and_then(|id| rels.get(id)) {
                    Some(rel) if rel.is_worksheet => Some(rel.part.clone()),
                    Some(_) => None,
                    None => {
                        let guess = format!("xl/worksheets/sheet{}.xml", index + 1);
                        package.has_part(&guess).then_some(guess)
                    }
                };
                debug!("sheet {} \"{}\" -> {:?}", index, name, part);
                SheetInfo { name, index, part }
            })
            .collect();

        Ok(Self::from_sheets(sheets))
    }

    /// Build a table from sheets already in workbook order
    pub fn from_sheets(sheets: Vec<SheetInfo>) -> Self {
        // Later sheets overwrite earlier ones with the same normalized name
        let by_name = sheets
            .iter()
            .map(|sheet| (normalize(&sheet.name), sheet.index))
            .collect();
        Self { sheets, by_name }
    }

    /// Find a sheet by name, ignoring case and surrounding whitespace
    pub fn resolve(&self, name: &str) -> XlsxResult<&SheetInfo> {
        self.by_name
            .get(&normalize(name))
            .and_then(|index| self.sheets.get(*index))
            .ok_or_else(|| CoreError::SheetNotFound(name.to_owned()).into())
    }

    /// Sheet at a 0-based position
    pub fn get(&self, index: usize) -> Option<&SheetInfo> {
        self.sheets.get(index)
    }

    /// Sheets in workbook order
    pub fn iter(&self) -> std::slice::Iter<'_, SheetInfo> {
        self.sheets.iter()
    }

    /// Number of sheets
    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    /// Returns `true` if the workbook lists no sheets
    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }
}

impl<'a> IntoIterator for &'a SheetTable {
    type Item = &'a SheetInfo;
    type IntoIter = std::slice::Iter<'a, SheetInfo>;

    fn into_iter(self) -> Self::IntoIter {
        self.sheets.iter()
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Read workbook.xml to get (name, relationship id) per sheet
fn read_workbook_xml(xml: &[u8]) -> XlsxResult<Vec<(String, Option<String>)>> {
    let mut xml_reader = Reader::from_reader(xml);
    xml_reader.trim_text(true);

    let mut buf = Vec::new();
    let mut sheets = Vec::new();

    loop {
        match xml_reader.read_event_into(&mut buf)? {
            Event::Empty(e) | Event::Start(e) if e.local_name().as_ref() == b"sheet" => {
                let mut name = None;
                let mut r_id = None;

                for attr in e.attributes() {
                    let attr = attr?;
                    match attr.key.local_name().as_ref() {
                        b"name" => name = Some(attr.unescape_value()?.into_owned()),
                        // `r:id`, under whatever prefix the document binds
                        b"id" if attr.key.prefix().is_some() => {
                            r_id = Some(attr.unescape_value()?.into_owned())
                        }
                        _ => {}
                    }
                }

                let name = name.ok_or_else(|| {
                    XlsxError::malformed(format!("<sheet> without a name in {}", WORKBOOK_PART))
                })?;
                sheets.push((name, r_id));
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(sheets)
}

/// Read workbook.xml.rels to map relationship ids to part names
fn read_workbook_rels(xml: &[u8]) -> XlsxResult<HashMap<String, Relationship>> {
    let mut xml_reader = Reader::from_reader(xml);
    xml_reader.trim_text(true);

    let mut buf = Vec::new();
    let mut rels = HashMap::new();

    loop {
        match xml_reader.read_event_into(&mut buf)? {
            Event::Empty(e) | Event::Start(e) if e.local_name().as_ref() == b"Relationship" => {
                let mut id = None;
                let mut target = None;
                let mut rel_type = None;

                for attr in e.attributes() {
                    let attr = attr?;
                    match attr.key.as_ref() {
                        b"Id" => id = Some(attr.unescape_value()?.into_owned()),
                        b"Target" => target = Some(attr.unescape_value()?.into_owned()),
                        b"Type" => rel_type = Some(attr.unescape_value()?.into_owned()),
                        _ => {}
                    }
                }

                if let (Some(id), Some(target)) = (id, target) {
                    let is_worksheet = rel_type.is_some_and(|t| t.ends_with("/worksheet"));
                    rels.insert(
                        id,
                        Relationship {
                            part: resolve_target("xl", &target),
                            is_worksheet,
                        },
                    );
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(rels)
}

/// Resolve a relationship target against the directory of its source part.
///
/// Absolute targets (`/xl/worksheets/sheet1.xml`) are package-rooted; `.` and
/// `..` segments are folded.
pub(crate) fn resolve_target(base_dir: &str, target: &str) -> String {
    let (mut segments, rest): (Vec<&str>, &str) = match target.strip_prefix('/') {
        Some(absolute) => (Vec::new(), absolute),
        None => (base_dir.split('/').filter(|s| !s.is_empty()).collect(), target),
    };
    for segment in rest.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}
