//! In-memory workbook fixtures for the integration tests

#![allow(dead_code)]

use std::io::{Cursor, Write};

use stencil::{Package, WorksheetTree};

const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Shared strings referenced by the fixtures: index 0 "Name", 1 "Total", 2 "old"
pub const SHARED_STRINGS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="3" uniqueCount="3"><si><t>Name</t></si><si><t>Total</t></si><si><t>old</t></si></sst>"#;

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><fonts count="1"><font><sz val="11"/></font></fonts><cellXfs count="2"><xf numFmtId="0" fontId="0"/><xf numFmtId="4" fontId="0"/></cellXfs></styleSheet>"#;

/// Build a workbook whose sheets hold the given `<sheetData>` contents.
pub fn workbook(sheets: &[(&str, &str)]) -> Vec<u8> {
    build(sheets, None)
}

/// Like [`workbook`], plus an `xl/calcChain.xml` part with its relationship
/// and content-type override
pub fn workbook_with_calc_chain(sheets: &[(&str, &str)], calc_chain: &str) -> Vec<u8> {
    build(sheets, Some(calc_chain))
}

fn build(sheets: &[(&str, &str)], calc_chain: Option<&str>) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();

    let mut overrides = String::new();
    let mut sheet_entries = String::new();
    let mut rels = String::new();
    for (i, (name, _)) in sheets.iter().enumerate() {
        let n = i + 1;
        overrides.push_str(&format!(
            r#"<Override PartName="/xl/worksheets/sheet{n}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#
        ));
        sheet_entries.push_str(&format!(r#"<sheet name="{name}" sheetId="{n}" r:id="rId{n}"/>"#));
        rels.push_str(&format!(
            r#"<Relationship Id="rId{n}" Type="{REL_NS}/worksheet" Target="worksheets/sheet{n}.xml"/>"#
        ));
    }
    let styles_id = sheets.len() + 1;
    let strings_id = sheets.len() + 2;
    rels.push_str(&format!(
        r#"<Relationship Id="rId{styles_id}" Type="{REL_NS}/styles" Target="styles.xml"/><Relationship Id="rId{strings_id}" Type="{REL_NS}/sharedStrings" Target="sharedStrings.xml"/>"#
    ));
    if calc_chain.is_some() {
        let chain_id = sheets.len() + 3;
        rels.push_str(&format!(
            r#"<Relationship Id="rId{chain_id}" Type="{REL_NS}/calcChain" Target="calcChain.xml"/>"#
        ));
        overrides.push_str(
            r#"<Override PartName="/xl/calcChain.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.calcChain+xml"/>"#,
        );
    }

    let mut put = |name: &str, content: &str| {
        zip.start_file(name, options).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    };

    put(
        "[Content_Types].xml",
        &format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>{overrides}</Types>"#
        ),
    );
    put(
        "_rels/.rels",
        &format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="{REL_NS}/officeDocument" Target="xl/workbook.xml"/></Relationships>"#
        ),
    );
    put(
        "xl/workbook.xml",
        &format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="{MAIN_NS}" xmlns:r="{REL_NS}"><sheets>{sheet_entries}</sheets><calcPr calcId="191029"/></workbook>"#
        ),
    );
    put(
        "xl/_rels/workbook.xml.rels",
        &format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{rels}</Relationships>"#
        ),
    );
    for (i, (_, data)) in sheets.iter().enumerate() {
        put(&format!("xl/worksheets/sheet{}.xml", i + 1), &worksheet(data));
    }
    put("xl/styles.xml", STYLES);
    put("xl/sharedStrings.xml", SHARED_STRINGS);
    if let Some(chain) = calc_chain {
        put(
            "xl/calcChain.xml",
            &format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<calcChain xmlns="{MAIN_NS}">{chain}</calcChain>"#
            ),
        );
    }

    zip.finish().unwrap().into_inner()
}

/// A worksheet part around the given `<sheetData>` contents
pub fn worksheet(sheet_data: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="{MAIN_NS}" xmlns:r="{REL_NS}"><dimension ref="A1:C3"/><sheetViews><sheetView workbookViewId="0"/></sheetViews><sheetFormatPr defaultRowHeight="15"/><sheetData>{sheet_data}</sheetData><pageMargins left="0.7" right="0.7" top="0.75" bottom="0.75" header="0.3" footer="0.3"/></worksheet>"#
    )
}

/// Read a part of a saved workbook as text
pub fn part(bytes: &[u8], name: &str) -> String {
    let package = Package::from_bytes(bytes.to_vec()).unwrap();
    String::from_utf8(package.read_part(name).unwrap()).unwrap()
}

/// What a saved cell holds
#[derive(Debug, Clone, PartialEq)]
pub struct SavedCell {
    /// The `t` attribute
    pub cell_type: Option<String>,
    /// Inline string text, or the `<v>` text
    pub value: Option<String>,
    /// The `<f>` text
    pub formula: Option<String>,
    /// The `s` attribute
    pub style: Option<String>,
}

/// Look up a cell of a saved worksheet by reference
pub fn cell(bytes: &[u8], sheet: usize, reference: &str) -> Option<SavedCell> {
    let xml = part(bytes, &format!("xl/worksheets/sheet{}.xml", sheet));
    let tree = WorksheetTree::parse(xml.as_bytes()).unwrap();
    let rows: Vec<_> = tree.rows().unwrap().collect();

    let found = rows
        .into_iter()
        .flat_map(|row| row.elements())
        .find(|c| c.local_name() == "c" && c.attribute("r") == Some(reference))
        .map(|c| {
            let cell_type = c.attribute("t").map(str::to_string);
            let value = if cell_type.as_deref() == Some("inlineStr") {
                c.child("is").and_then(|is| is.child("t")).map(|t| t.text())
            } else {
                c.child("v").map(|v| v.text())
            };
            SavedCell {
                cell_type,
                value,
                formula: c.child("f").map(|f| f.text()),
                style: c.attribute("s").map(str::to_string),
            }
        });
    found
}

/// Row numbers and cell references of a saved worksheet, in document order
pub fn layout(bytes: &[u8], sheet: usize) -> Vec<(String, Vec<String>)> {
    let xml = part(bytes, &format!("xl/worksheets/sheet{}.xml", sheet));
    let tree = WorksheetTree::parse(xml.as_bytes()).unwrap();
    let rows = tree
        .rows()
        .unwrap()
        .map(|row| {
            (
                row.attribute("r").unwrap_or_default().to_string(),
                row.elements()
                    .filter(|c| c.local_name() == "c")
                    .map(|c| c.attribute("r").unwrap_or_default().to_string())
                    .collect(),
            )
        })
        .collect();
    rows
}
