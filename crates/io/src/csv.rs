// CSV export for report rows.

use std::path::Path;

use midio_report::{Cell, ReportRow};

/// Write the report as CSV in column order. A report with no rows still
/// gets its header record.
pub fn export(columns: &[String], rows: &[ReportRow], path: &Path) -> Result<(), String> {
    let mut writer = csv::WriterBuilder::new()
        .from_path(path)
        .map_err(|e| e.to_string())?;

    writer.write_record(columns).map_err(|e| e.to_string())?;

    for row in rows {
        let record: Vec<String> = columns
            .iter()
            .map(|column| row.get(column).map_or_else(String::new, Cell::normalized))
            .collect();
        writer.write_record(&record).map_err(|e| e.to_string())?;
    }

    writer.flush().map_err(|e| e.to_string())?;
    Ok(())
}
