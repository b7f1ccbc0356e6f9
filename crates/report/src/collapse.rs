use std::collections::BTreeMap;

use crate::model::{CollapsedMetric, Metric, MetricRow, MonthMetrics};
use crate::months::Month;

/// Group flat metric rows by mid, nesting each count under its month.
/// A repeated (mid, month) overwrites the earlier count for that metric;
/// distinct months never collide.
pub fn collapse(rows: &[MetricRow], metric: Metric) -> Vec<CollapsedMetric> {
    let mut groups: BTreeMap<i64, BTreeMap<Month, MonthMetrics>> = BTreeMap::new();

    for row in rows {
        let months = groups.entry(row.mid_id).or_default();
        months.entry(row.month).or_default().set(metric, row.count);
    }

    groups
        .into_iter()
        .map(|(mid_id, months)| CollapsedMetric { mid_id, months })
        .collect()
}
