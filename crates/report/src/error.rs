use std::fmt;

use chrono::NaiveDate;

#[derive(Debug)]
pub enum ReportError {
    /// Range end precedes range start. Checked before any data is fetched.
    InvalidRange { start: NaiveDate, end: NaiveDate },
    /// A month group key did not parse as `YYYY-MM`.
    MonthParse { value: String },
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRange { start, end } => {
                write!(f, "invalid range: end {end} precedes start {start}")
            }
            Self::MonthParse { value } => write!(f, "cannot parse month '{value}'"),
        }
    }
}

impl std::error::Error for ReportError {}
