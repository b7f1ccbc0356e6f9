use crate::model::{Cell, MergedRecord, Metric, ReportRow};
use crate::months::Month;

/// Identity columns, in export order.
pub const IDENTITY_COLUMNS: [&str; 3] = ["created_at", "mid", "company_id"];

fn metric_column(month: &Month, metric: Metric) -> String {
    format!("{month} {metric}")
}

/// The full export column list for a month range: identity columns, then a
/// `"{month} cb"` / `"{month} alert"` pair per month in chronological
/// order. Derived from the range alone, never from which rows happen to
/// carry data, so it is available even for an empty result set.
pub fn report_columns(months: &[Month]) -> Vec<String> {
    let mut columns: Vec<String> = IDENTITY_COLUMNS.iter().map(|c| c.to_string()).collect();
    for month in months {
        columns.push(metric_column(month, Metric::Chargeback));
        columns.push(metric_column(month, Metric::Alert));
    }
    columns
}

/// Project merged records into export rows. Every row carries exactly the
/// columns of `report_columns(months)`: a month with no recorded metric
/// projects an empty cell, never a zero, and months outside the range are
/// dropped. Creation dates stay typed here; ISO normalization happens at
/// export.
pub fn project(records: &[MergedRecord], months: &[Month]) -> Vec<ReportRow> {
    records.iter().map(|record| project_record(record, months)).collect()
}

fn project_record(record: &MergedRecord, months: &[Month]) -> ReportRow {
    let mut row = ReportRow::new();

    match &record.identity {
        Some(id) => {
            row.insert("created_at".to_string(), Cell::Date(id.created_at));
            row.insert("mid".to_string(), Cell::Text(id.mid.clone()));
            row.insert(
                "company_id".to_string(),
                id.company_id.map_or(Cell::Empty, Cell::Int),
            );
        }
        None => {
            for column in IDENTITY_COLUMNS {
                row.insert(column.to_string(), Cell::Empty);
            }
        }
    }

    for month in months {
        let metrics = record.months.get(month).copied().unwrap_or_default();
        for metric in [Metric::Chargeback, Metric::Alert] {
            row.insert(
                metric_column(month, metric),
                metrics.get(metric).map_or(Cell::Empty, Cell::Int),
            );
        }
    }

    row
}
