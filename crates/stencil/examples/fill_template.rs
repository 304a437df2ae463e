//! Example: fill a report template
//!
//! ```text
//! cargo run --example fill_template -- template.xlsx filled.xlsx
//! ```

use stencil::prelude::*;

fn main() -> XlsxResult<()> {
    let mut args = std::env::args().skip(1);
    let (Some(template), Some(output)) = (args.next(), args.next()) else {
        eprintln!("usage: fill_template <template.xlsx> <output.xlsx>");
        std::process::exit(2);
    };

    let mut writer = TemplateWriter::open(&template)?;
    println!("Sheets: {}", writer.sheet_names().join(", "));

    // Header row on the first sheet
    writer.write_cell("A", 1, "Region", None)?;
    writer.write_cell("B", 1, "Population", None)?;

    // Data rows
    writer.fill_column("A", 2, ["North", "South", "East"], None)?;
    writer.fill_column("B", 2, [1250, 980, 1432], None)?;

    // Codes with leading zeros stay text
    writer.fill_column("C", 2, ["007", "012", "103"], Some(CellType::String))?;

    let stats = writer.save(&output)?;
    println!(
        "Wrote {}: {} cell(s) inserted, {} updated, {} formula cache(s) cleared",
        output,
        stats.merge.cells_inserted,
        stats.merge.cells_updated,
        stats.merge.formula_caches_cleared
    );
    Ok(())
}
