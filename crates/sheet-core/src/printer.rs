//! Grid-walking formatters over a sheet's printable bounding box.
//!
//! Rows are emitted top-to-bottom, `\n`-terminated; cells within a row are
//! joined by `\t`. An absent or Empty cell renders as the empty field.

use std::fmt::Write as _;

use sheet_types::{CellValue, Position};

use crate::sheet::Sheet;

/// Render every cell's `value()` over the printable bounding box.
pub fn print_values(sheet: &Sheet) -> String {
    render(sheet, |sheet, pos| match sheet.get_cell(pos) {
        Ok(Some(cell)) => match cell.value(sheet) {
            CellValue::String(s) => s,
            CellValue::Number(n) => n.to_string(),
            CellValue::Error(e) => e.tag().to_string(),
        },
        _ => String::new(),
    })
}

/// Render every cell's `text()` over the printable bounding box.
pub fn print_texts(sheet: &Sheet) -> String {
    render(sheet, |sheet, pos| match sheet.get_cell(pos) {
        Ok(Some(cell)) => cell.text(),
        _ => String::new(),
    })
}

fn render(sheet: &Sheet, field: impl Fn(&Sheet, Position) -> String) -> String {
    let (rows, cols) = sheet.printable_size();
    let mut out = String::new();
    for row in 0..rows {
        for col in 0..cols {
            if col > 0 {
                out.push('\t');
            }
            write!(out, "{}", field(sheet, Position::new(row, col))).expect("writing to a String never fails");
        }
        out.push('\n');
    }
    out
}
