//! `midio-report`: monthly MID metric reshaping engine.
//!
//! Pure engine crate: receives pre-fetched rows, returns export-ready report
//! rows. No database or CLI dependencies.

pub mod collapse;
pub mod error;
pub mod merge;
pub mod model;
pub mod months;
pub mod schema;

pub use collapse::collapse;
pub use error::ReportError;
pub use merge::{deep_merge, merge_records};
pub use model::{Cell, CollapsedMetric, MergedRecord, Metric, MetricRow, MidRecord, MonthMetrics, ReportRow};
pub use months::{month_range, Month};
pub use schema::{project, report_columns};
