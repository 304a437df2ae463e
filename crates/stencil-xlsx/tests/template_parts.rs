//! Tests for sheet resolution and repacking against whole packages

use std::collections::HashMap;
use std::io::{Cursor, Write};

use pretty_assertions::assert_eq;
use stencil_core::PendingEdits;
use stencil_xlsx::{Package, SaveOptions, XlsxError, XlsxTemplate};

const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

fn package(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut buf = Vec::new();
    {
        let cursor = Cursor::new(&mut buf);
        let mut zip = zip::ZipWriter::new(cursor);
        let options = zip::write::SimpleFileOptions::default();
        for (name, content) in entries {
            zip.start_file(*name, options).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }
    buf
}

fn workbook_xml(sheets: &str) -> String {
    format!(
        r#"<?xml version="1.0"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="{REL_NS}"><sheets>{sheets}</sheets></workbook>"#
    )
}

const WORKSHEET: &str = r#"<?xml version="1.0"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData><row r="1"><c r="A1"><f>1+1</f><v>2</v></c></row></sheetData></worksheet>"#;

/// A chartsheet, a worksheet stored under a custom name and a worksheet
/// found only by its conventional name
fn mixed_template() -> Vec<u8> {
    package(&[
        ("[Content_Types].xml", "<Types/>"),
        (
            "xl/workbook.xml",
            &workbook_xml(
                r#"<sheet name="Chart" sheetId="1" r:id="rId1"/><sheet name="Data" sheetId="2" r:id="rId2"/><sheet name="Notes" sheetId="3"/>"#,
            ),
        ),
        (
            "xl/_rels/workbook.xml.rels",
            &format!(
                r#"<?xml version="1.0"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="{REL_NS}/chartsheet" Target="chartsheets/sheet1.xml"/><Relationship Id="rId2" Type="{REL_NS}/worksheet" Target="/xl/worksheets/data.xml"/></Relationships>"#
            ),
        ),
        ("xl/chartsheets/sheet1.xml", "<chartsheet/>"),
        ("xl/worksheets/data.xml", WORKSHEET),
        ("xl/worksheets/sheet3.xml", WORKSHEET),
    ])
}

/// Sheets resolve through relationships, falling back to conventional names
#[test]
fn test_sheet_parts_are_resolved() {
    let template = XlsxTemplate::from_bytes(mixed_template()).unwrap();
    let parts: Vec<(String, Option<String>)> = template
        .sheets()
        .iter()
        .map(|s| (s.name.clone(), s.part.clone()))
        .collect();

    assert_eq!(
        parts,
        vec![
            ("Chart".to_string(), None),
            ("Data".to_string(), Some("xl/worksheets/data.xml".to_string())),
            ("Notes".to_string(), Some("xl/worksheets/sheet3.xml".to_string())),
        ]
    );
}

/// Only worksheets are rewritten; everything else is copied
#[test]
fn test_only_worksheets_are_rewritten() {
    let bytes = mixed_template();
    let template = XlsxTemplate::from_bytes(bytes.clone()).unwrap();
    let mut edits = PendingEdits::new();
    edits.set(1, 1, "B", "new", None).unwrap();

    let (out, stats) = template
        .write(&edits, Cursor::new(Vec::new()), &SaveOptions::default())
        .unwrap();
    assert_eq!(stats.sheets_rewritten, 2);
    assert_eq!(stats.merge.cells_inserted, 1);
    assert_eq!(stats.merge.formula_caches_cleared, 2);

    let original = Package::from_bytes(bytes).unwrap();
    let saved = Package::from_bytes(out.into_inner()).unwrap();
    assert_eq!(saved.part_names(), original.part_names());
    assert_eq!(
        saved.read_part("xl/chartsheets/sheet1.xml").unwrap(),
        original.read_part("xl/chartsheets/sheet1.xml").unwrap()
    );
    assert_eq!(
        String::from_utf8(saved.read_part("xl/worksheets/data.xml").unwrap()).unwrap(),
        r#"<?xml version="1.0"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData><row r="1"><c r="A1"><f>1+1</f></c><c r="B1" t="inlineStr"><is><t>new</t></is></c></row></sheetData></worksheet>"#
    );
}

/// Edits aimed at a chartsheet cannot be applied
#[test]
fn test_edits_on_chartsheet_fail() {
    let template = XlsxTemplate::from_bytes(mixed_template()).unwrap();
    let mut edits = PendingEdits::new();
    edits.set(0, 1, "A", 1, None).unwrap();

    let err = template
        .write(&edits, Cursor::new(Vec::new()), &SaveOptions::default())
        .unwrap_err();
    assert!(matches!(err, XlsxError::MalformedTemplate(_)));
}

/// Edits keyed past the last sheet are reported as a missing sheet
#[test]
fn test_edits_on_unknown_sheet_fail() {
    let template = XlsxTemplate::from_bytes(mixed_template()).unwrap();
    let mut edits = PendingEdits::new();
    edits.set(7, 1, "A", 1, None).unwrap();

    let err = template
        .write(&edits, Cursor::new(Vec::new()), &SaveOptions::default())
        .unwrap_err();
    assert!(matches!(
        err,
        XlsxError::Core(stencil_core::Error::SheetNotFound(_))
    ));
}

/// A workbook part is required
#[test]
fn test_missing_workbook() {
    let bytes = package(&[("[Content_Types].xml", "<Types/>")]);
    assert!(matches!(
        XlsxTemplate::from_bytes(bytes),
        Err(XlsxError::MissingPart(_))
    ));
}

/// Replaced parts take the requested compression; others keep theirs
#[test]
fn test_repack_compression() {
    let original = Package::from_bytes(mixed_template()).unwrap();
    let mut replacements = HashMap::new();
    replacements.insert("xl/worksheets/sheet3.xml".to_string(), WORKSHEET.as_bytes().to_vec());

    let out = original
        .repack(Cursor::new(Vec::new()), &replacements, zip::CompressionMethod::Stored)
        .unwrap()
        .into_inner();

    let mut archive = zip::ZipArchive::new(Cursor::new(out)).unwrap();
    assert_eq!(
        archive.by_name("xl/worksheets/sheet3.xml").unwrap().compression(),
        zip::CompressionMethod::Stored
    );
    assert_eq!(
        archive.by_name("xl/worksheets/data.xml").unwrap().compression(),
        zip::CompressionMethod::Deflated
    );
}
