use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Serialize, Serializer};

use crate::error::ReportError;

/// A calendar month. Ordering is chronological; the display form is the
/// full report label, e.g. `January 2017`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month {
    pub year: i32,
    /// 1-12.
    pub month: u32,
}

impl Month {
    pub fn of(date: NaiveDate) -> Self {
        Self { year: date.year(), month: date.month() }
    }

    /// Parse the store's `YYYY-MM` month group key.
    pub fn from_group_key(key: &str) -> Result<Self, ReportError> {
        let date = NaiveDate::parse_from_str(&format!("{key}-01"), "%Y-%m-%d")
            .map_err(|_| ReportError::MonthParse { value: key.to_string() })?;
        Ok(Self::of(date))
    }

    /// Position on a linear month axis. Consecutive months differ by one,
    /// across year boundaries included.
    fn index(&self) -> i32 {
        self.year * 12 + (self.month as i32 - 1)
    }

    fn from_index(index: i32) -> Self {
        Self {
            year: index.div_euclid(12),
            month: (index.rem_euclid(12) + 1) as u32,
        }
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match NaiveDate::from_ymd_opt(self.year, self.month, 1) {
            Some(d) => write!(f, "{}", d.format("%B %Y")),
            None => write!(f, "{:04}-{:02}", self.year, self.month),
        }
    }
}

impl Serialize for Month {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Every calendar month from `start` through `end`, in order, inclusive on
/// both sides. Day-of-month is ignored: a range inside a single month
/// yields that one month. Fails when `end` precedes `start`; equal dates
/// are a valid one-month range.
pub fn month_range(start: NaiveDate, end: NaiveDate) -> Result<Vec<Month>, ReportError> {
    if end < start {
        return Err(ReportError::InvalidRange { start, end });
    }

    let first = Month::of(start).index();
    let last = Month::of(end).index();

    Ok((first..=last).map(Month::from_index).collect())
}
