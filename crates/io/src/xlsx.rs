// Excel export for report rows. Single sheet, header row first.

use std::path::Path;

use rust_xlsxwriter::Workbook as XlsxWorkbook;

use midio_report::{Cell, ReportRow};

const SHEET_NAME: &str = "MID IO";

/// Write the report as a single-sheet XLSX workbook: one header row, then
/// one row per record in column order. Empty cells stay unwritten so they
/// read back as blanks, not zeros.
pub fn export(columns: &[String], rows: &[ReportRow], path: &Path) -> Result<(), String> {
    let mut workbook = XlsxWorkbook::new();
    let worksheet = workbook
        .add_worksheet()
        .set_name(SHEET_NAME)
        .map_err(|e| format!("Failed to create sheet '{}': {}", SHEET_NAME, e))?;

    for (col, name) in columns.iter().enumerate() {
        worksheet
            .write_string(0, col as u16, name)
            .map_err(|e| format!("Failed to write header '{}': {}", name, e))?;
    }

    for (row_idx, row) in rows.iter().enumerate() {
        let excel_row = row_idx as u32 + 1;
        for (col, name) in columns.iter().enumerate() {
            match row.get(name) {
                None | Some(Cell::Empty) => {}
                Some(Cell::Int(n)) => {
                    worksheet
                        .write_number(excel_row, col as u16, *n as f64)
                        .map_err(|e| format!("Failed to write cell: {}", e))?;
                }
                Some(cell) => {
                    worksheet
                        .write_string(excel_row, col as u16, cell.normalized())
                        .map_err(|e| format!("Failed to write cell: {}", e))?;
                }
            }
        }
    }

    workbook
        .save(path)
        .map_err(|e| format!("Failed to save XLSX file: {}", e))?;

    Ok(())
}
