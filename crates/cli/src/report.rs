//! `midio report`: fetch, reshape, and export the monthly MID report.
//!
//! Pipeline: resolve the month window, fetch mids and per-month metric
//! counts, collapse and merge them into one record per mid, project onto
//! the window's column schema, write CSV or XLSX.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Serialize;

use midio_io::{csv, xlsx, MidStore};
use midio_report::{
    collapse, merge_records, month_range, project, report_columns, MergedRecord, Metric, Month,
};

use crate::{CliError, OutputFormat};

#[derive(Serialize)]
struct RunSummary {
    from: NaiveDate,
    to: NaiveDate,
    months: Vec<Month>,
    mids_total: usize,
    mids_in_range: usize,
    chargeback_rows: usize,
    alert_rows: usize,
    rows_written: usize,
    columns: usize,
    out: PathBuf,
}

#[allow(clippy::too_many_arguments)]
pub fn cmd_report(
    db: PathBuf,
    from: &str,
    to: &str,
    out: PathBuf,
    format: Option<OutputFormat>,
    json: bool,
    quiet: bool,
) -> Result<(), CliError> {
    let (start, end) = parse_date_range(from, to)?;
    let months = month_range(start, end).map_err(|e| CliError::args(e.to_string()))?;

    let store = MidStore::open(&db).map_err(CliError::store)?;

    let mids = store.all_mids().map_err(CliError::store)?;
    let mids_total = mids.len();
    let in_range: Vec<_> = mids.into_iter().filter(|m| m.created_in(start, end)).collect();
    let mid_ids: Vec<i64> = in_range.iter().map(|m| m.mid_id).collect();

    if !quiet {
        eprintln!("{} mids, {} created {} .. {}", mids_total, in_range.len(), from, to);
    }

    let cb_rows = store.chargeback_counts(&mid_ids).map_err(CliError::store)?;
    let alert_rows = store.alert_counts(&mid_ids).map_err(CliError::store)?;

    // Queries done; release the connection before writing.
    drop(store);

    let mids_in_range = in_range.len();
    let chargeback_rows = cb_rows.len();
    let alert_row_count = alert_rows.len();

    let merged = merge_records(
        merge_records(
            in_range.into_iter().map(MergedRecord::from).collect(),
            collapse(&cb_rows, Metric::Chargeback)
                .into_iter()
                .map(MergedRecord::from)
                .collect(),
        ),
        collapse(&alert_rows, Metric::Alert)
            .into_iter()
            .map(MergedRecord::from)
            .collect(),
    );

    let columns = report_columns(&months);
    let rows = project(&merged, &months);

    match output_format(&out, format) {
        OutputFormat::Csv => csv::export(&columns, &rows, &out).map_err(CliError::export)?,
        OutputFormat::Xlsx => xlsx::export(&columns, &rows, &out).map_err(CliError::export)?,
    }

    let summary = RunSummary {
        from: start,
        to: end,
        months,
        mids_total,
        mids_in_range,
        chargeback_rows,
        alert_rows: alert_row_count,
        rows_written: rows.len(),
        columns: columns.len(),
        out: out.clone(),
    };

    if json {
        let json_str = serde_json::to_string_pretty(&summary)
            .map_err(|e| CliError::internal(format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    }

    if !quiet {
        eprintln!(
            "{} rows x {} columns over {} months ({} chargeback rows, {} alert rows)",
            summary.rows_written,
            summary.columns,
            summary.months.len(),
            summary.chargeback_rows,
            summary.alert_rows,
        );
        eprintln!("wrote {}", out.display());
    }

    Ok(())
}

pub fn cmd_columns(from: &str, to: &str, json: bool) -> Result<(), CliError> {
    let (start, end) = parse_date_range(from, to)?;
    let months = month_range(start, end).map_err(|e| CliError::args(e.to_string()))?;
    let columns = report_columns(&months);

    if json {
        let json_str = serde_json::to_string_pretty(&columns)
            .map_err(|e| CliError::internal(format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    } else {
        for column in &columns {
            println!("{column}");
        }
    }

    Ok(())
}

/// Parse `--from` / `--to` as inclusive ISO dates. Equal dates are a valid
/// one-month window; a reversed pair is rejected before any query runs.
fn parse_date_range(from: &str, to: &str) -> Result<(NaiveDate, NaiveDate), CliError> {
    let start = parse_date("--from", from)?;
    let end = parse_date("--to", to)?;
    if end < start {
        return Err(CliError::args(format!("--to ({to}) precedes --from ({from})")));
    }
    Ok((start, end))
}

fn parse_date(flag: &str, value: &str) -> Result<NaiveDate, CliError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        CliError::args(format!("{flag} {value:?} is not a date")).with_hint("dates use YYYY-MM-DD")
    })
}

/// `--format` wins; otherwise the extension decides, with XLSX as the
/// fallback for anything that is not .csv.
fn output_format(out: &Path, forced: Option<OutputFormat>) -> OutputFormat {
    if let Some(format) = forced {
        return format;
    }
    match out.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("csv") => OutputFormat::Csv,
        _ => OutputFormat::Xlsx,
    }
}
