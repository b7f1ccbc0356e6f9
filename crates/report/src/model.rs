use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;

use crate::months::Month;

// ---------------------------------------------------------------------------
// Source rows
// ---------------------------------------------------------------------------

/// One merchant identifier with its metadata, as fetched from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct MidRecord {
    pub mid_id: i64,
    pub mid: String,
    pub created_at: NaiveDate,
    pub company_id: Option<i64>,
}

impl MidRecord {
    /// Whether this mid was created within `[start, end]`, inclusive on
    /// both ends, at date granularity.
    pub fn created_in(&self, start: NaiveDate, end: NaiveDate) -> bool {
        start <= self.created_at && self.created_at <= end
    }
}

/// One (mid, month) count from a grouped store query.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRow {
    pub mid_id: i64,
    pub month: Month,
    pub count: i64,
}

/// Which metric a count is filed under. Displays as the column suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Chargeback,
    Alert,
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Chargeback => write!(f, "cb"),
            Self::Alert => write!(f, "alert"),
        }
    }
}

// ---------------------------------------------------------------------------
// Collapsed + merged shapes
// ---------------------------------------------------------------------------

/// Metric counts for one calendar month. `None` means no data, which is
/// distinct from a recorded zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonthMetrics {
    pub cb_count: Option<i64>,
    pub alert_count: Option<i64>,
}

impl MonthMetrics {
    pub fn set(&mut self, metric: Metric, count: i64) {
        match metric {
            Metric::Chargeback => self.cb_count = Some(count),
            Metric::Alert => self.alert_count = Some(count),
        }
    }

    pub fn get(&self, metric: Metric) -> Option<i64> {
        match metric {
            Metric::Chargeback => self.cb_count,
            Metric::Alert => self.alert_count,
        }
    }

    /// Overlay `other` on top of self. Present fields win; absent fields
    /// never erase an earlier value.
    pub fn merge_from(&mut self, other: MonthMetrics) {
        if let Some(n) = other.cb_count {
            self.cb_count = Some(n);
        }
        if let Some(n) = other.alert_count {
            self.alert_count = Some(n);
        }
    }
}

/// One mid's metric rows collapsed to a month-keyed map.
#[derive(Debug, Clone, PartialEq)]
pub struct CollapsedMetric {
    pub mid_id: i64,
    pub months: BTreeMap<Month, MonthMetrics>,
}

/// Identity fields carried from a [`MidRecord`] through the merge.
#[derive(Debug, Clone, PartialEq)]
pub struct MidIdentity {
    pub mid: String,
    pub created_at: NaiveDate,
    pub company_id: Option<i64>,
}

/// The unit the deep merge operates on: one mid's identity (when known)
/// plus everything recorded against it, keyed by month.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedRecord {
    pub mid_id: i64,
    pub identity: Option<MidIdentity>,
    pub months: BTreeMap<Month, MonthMetrics>,
}

impl From<MidRecord> for MergedRecord {
    fn from(rec: MidRecord) -> Self {
        Self {
            mid_id: rec.mid_id,
            identity: Some(MidIdentity {
                mid: rec.mid,
                created_at: rec.created_at,
                company_id: rec.company_id,
            }),
            months: BTreeMap::new(),
        }
    }
}

impl From<CollapsedMetric> for MergedRecord {
    fn from(collapsed: CollapsedMetric) -> Self {
        Self {
            mid_id: collapsed.mid_id,
            identity: None,
            months: collapsed.months,
        }
    }
}

// ---------------------------------------------------------------------------
// Export cells
// ---------------------------------------------------------------------------

/// A single report cell. Empty is a real state: exported as a blank cell,
/// never coerced to zero.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Int(i64),
    Date(NaiveDate),
}

impl Cell {
    /// Export form: dates normalized to ISO `YYYY-MM-DD`, integers in
    /// decimal, text unchanged, Empty as the empty string.
    pub fn normalized(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(s) => s.clone(),
            Self::Int(n) => n.to_string(),
            Self::Date(d) => d.format("%Y-%m-%d").to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// One export row: column name to cell. Column order is owned by the
/// schema's column list, not by this map.
pub type ReportRow = BTreeMap<String, Cell>;
