//! Stencil CLI - fill cell values into an XLSX template

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use serde::Deserialize;
use stencil::prelude::*;
use stencil::CellRef;
use std::path::{Path, PathBuf};
use tracing_subscriber::filter::LevelFilter;

#[derive(Parser)]
#[command(name = "stencil")]
#[command(author, version, about = "Fill cell values into an XLSX template")]
struct Cli {
    /// Increase log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write values into a copy of a template
    Fill {
        /// Template workbook (xlsx)
        template: PathBuf,

        /// Where to write the filled workbook
        #[arg(short, long)]
        output: PathBuf,

        /// Sheet that --set and --set-text write to (default: first sheet)
        #[arg(short, long)]
        sheet: Option<String>,

        /// Cell assignment such as B2=500; numbers are stored as numbers
        #[arg(long = "set", value_name = "CELL=VALUE", value_parser = parse_assignment)]
        set: Vec<(CellRef, String)>,

        /// Cell assignment always stored as text, such as A1=007
        #[arg(long = "set-text", value_name = "CELL=VALUE", value_parser = parse_assignment)]
        set_text: Vec<(CellRef, String)>,

        /// JSON file with cell and column edits
        #[arg(short, long)]
        edits: Option<PathBuf>,

        /// Store rewritten parts without compression
        #[arg(long)]
        stored: bool,

        /// Ask the spreadsheet application to recalculate every formula on open
        #[arg(long)]
        full_calc: bool,
    },

    /// List all sheets in a template
    Sheets {
        /// Template workbook (xlsx)
        template: PathBuf,
    },
}

/// Edits file: a list of per-sheet edit groups
#[derive(Debug, Deserialize)]
struct EditsFile {
    sheets: Vec<SheetEdits>,
}

#[derive(Debug, Deserialize)]
struct SheetEdits {
    /// Sheet name; the selected sheet when omitted
    #[serde(default)]
    sheet: Option<String>,
    #[serde(default)]
    cells: Vec<CellEntry>,
    #[serde(default)]
    columns: Vec<ColumnEntry>,
}

#[derive(Debug, Deserialize)]
struct CellEntry {
    cell: String,
    value: CellValue,
    #[serde(default, rename = "type")]
    cell_type: Option<CellType>,
}

#[derive(Debug, Deserialize)]
struct ColumnEntry {
    column: String,
    start_row: u32,
    values: Vec<CellValue>,
    #[serde(default, rename = "type")]
    cell_type: Option<CellType>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Fill {
            template,
            output,
            sheet,
            set,
            set_text,
            edits,
            stored,
            full_calc,
        } => {
            let options = SaveOptions::new()
                .with_compression(if stored {
                    Compression::Stored
                } else {
                    Compression::Deflated
                })
                .with_full_calc_on_load(full_calc);
            fill(
                &template,
                &output,
                sheet.as_deref(),
                &set,
                &set_text,
                edits.as_deref(),
                &options,
            )
        }
        Commands::Sheets { template } => list_sheets(&template),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn fill(
    template: &Path,
    output: &Path,
    sheet: Option<&str>,
    set: &[(CellRef, String)],
    set_text: &[(CellRef, String)],
    edits: Option<&Path>,
    options: &SaveOptions,
) -> Result<()> {
    let mut writer = TemplateWriter::open(template)
        .with_context(|| format!("Failed to open '{}'", template.display()))?;

    if let Some(name) = sheet {
        writer
            .select_sheet(name)
            .with_context(|| format!("No sheet named '{}'", name))?;
    }

    for (cell, raw) in set {
        writer
            .write_cell(&cell.column, cell.row, parse_value(raw), None)
            .with_context(|| format!("Failed to set {}", cell))?;
    }
    for (cell, raw) in set_text {
        writer
            .write_cell(&cell.column, cell.row, raw.as_str(), Some(CellType::String))
            .with_context(|| format!("Failed to set {}", cell))?;
    }

    if let Some(path) = edits {
        apply_edits_file(&mut writer, path, sheet)?;
    }

    if writer.pending().is_empty() {
        eprintln!("Warning: no edits given, writing a copy with formula caches cleared");
    }

    let stats = writer
        .save_with_options(output, options)
        .with_context(|| format!("Failed to write '{}'", output.display()))?;

    eprintln!(
        "Wrote '{}': {} cell(s) inserted, {} updated, {} formula cache(s) cleared, {} formula(s) replaced",
        output.display(),
        stats.merge.cells_inserted,
        stats.merge.cells_updated,
        stats.merge.formula_caches_cleared,
        stats.merge.formulas_removed
    );
    Ok(())
}

fn apply_edits_file(writer: &mut TemplateWriter, path: &Path, default_sheet: Option<&str>) -> Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read '{}'", path.display()))?;
    let file: EditsFile = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse '{}'", path.display()))?;

    let first_sheet = writer
        .sheet_names()
        .first()
        .map(|name| name.to_string());

    for group in file.sheets {
        let target = group
            .sheet
            .as_deref()
            .or(default_sheet)
            .or(first_sheet.as_deref());
        let Some(target) = target else {
            bail!("'{}' has edits but the template has no sheets", path.display());
        };
        writer
            .select_sheet(target)
            .with_context(|| format!("No sheet named '{}'", target))?;

        for entry in group.cells {
            let cell = CellRef::parse(&entry.cell)
                .with_context(|| format!("Bad cell reference '{}'", entry.cell))?;
            writer
                .write_cell(&cell.column, cell.row, entry.value, entry.cell_type)
                .with_context(|| format!("Failed to set {}!{}", target, cell))?;
        }
        for entry in group.columns {
            writer
                .fill_column(entry.column.as_str(), entry.start_row, entry.values, entry.cell_type)
                .with_context(|| format!("Failed to fill column {} of {}", entry.column, target))?;
        }
    }
    Ok(())
}

fn list_sheets(template: &Path) -> Result<()> {
    let writer = TemplateWriter::open(template)
        .with_context(|| format!("Failed to open '{}'", template.display()))?;

    for (i, name) in writer.sheet_names().into_iter().enumerate() {
        println!("{}\t{}", i + 1, name);
    }

    Ok(())
}

/// Parse `CELL=VALUE`
fn parse_assignment(s: &str) -> std::result::Result<(CellRef, String), String> {
    let (cell, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected CELL=VALUE, got '{}'", s))?;
    let cell = CellRef::parse(cell).map_err(|e| e.to_string())?;
    Ok((cell, value.to_string()))
}

/// A finite number when the text reads as one, text otherwise
fn parse_value(raw: &str) -> CellValue {
    match raw.trim().parse::<f64>() {
        Ok(n) if n.is_finite() => CellValue::Number(n),
        _ => CellValue::from(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_assignment() {
        let (cell, value) = parse_assignment("b2=500").unwrap();
        assert_eq!(cell.to_string(), "B2");
        assert_eq!(value, "500");

        let (_, value) = parse_assignment("A1=x=y").unwrap();
        assert_eq!(value, "x=y");

        assert!(parse_assignment("B2").is_err());
        assert!(parse_assignment("B0=1").is_err());
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("500"), CellValue::Number(500.0));
        assert_eq!(parse_value("2.5"), CellValue::Number(2.5));
        assert_eq!(parse_value("1/10"), CellValue::from("1/10"));
        assert_eq!(parse_value("inf"), CellValue::from("inf"));
    }

    #[test]
    fn test_edits_file_format() {
        let file: EditsFile = serde_json::from_str(
            r#"{
                "sheets": [
                    {
                        "sheet": "Demographics",
                        "cells": [{"cell": "B2", "value": 500}],
                        "columns": [{"column": "E", "start_row": 2, "values": ["1/10", "2/10"], "type": "string"}]
                    },
                    {"cells": [{"cell": "A1", "value": "007", "type": "string"}]}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(file.sheets.len(), 2);
        assert_eq!(file.sheets[0].sheet.as_deref(), Some("Demographics"));
        assert_eq!(file.sheets[0].cells[0].value, CellValue::Number(500.0));
        assert_eq!(file.sheets[0].columns[0].cell_type, Some(CellType::String));
        assert!(file.sheets[1].sheet.is_none());
        assert!(file.sheets[1].columns.is_empty());
    }

    #[test]
    fn test_cli_parses_fill() {
        let cli = Cli::try_parse_from([
            "stencil", "-vv", "fill", "in.xlsx", "-o", "out.xlsx", "--set", "B2=500", "--set-text",
            "A1=007", "--full-calc",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Fill { set, set_text, full_calc, stored, .. } => {
                assert_eq!(set.len(), 1);
                assert_eq!(set_text[0].1, "007");
                assert!(full_calc);
                assert!(!stored);
            }
            Commands::Sheets { .. } => panic!("expected fill"),
        }
    }
}
