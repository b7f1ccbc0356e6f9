use std::collections::HashMap;

use crate::model::MergedRecord;

/// Keyed, order-preserving union of two record lists. Base entries keep
/// their positions; mids seen only in the overlay append in overlay order;
/// shared mids deep-merge in place.
pub fn merge_records(base: Vec<MergedRecord>, overlay: Vec<MergedRecord>) -> Vec<MergedRecord> {
    let mut merged: Vec<MergedRecord> = Vec::with_capacity(base.len() + overlay.len());
    let mut index: HashMap<i64, usize> = HashMap::new();

    for record in base.into_iter().chain(overlay) {
        match index.get(&record.mid_id) {
            Some(&pos) => deep_merge(&mut merged[pos], record),
            None => {
                index.insert(record.mid_id, merged.len());
                merged.push(record);
            }
        }
    }

    merged
}

/// Recursive union of two records for the same mid. Month maps merge
/// key-by-key so both sides' metrics for the same month coexist; leaf
/// values on the later side win; an absent later value never erases an
/// earlier one.
pub fn deep_merge(into: &mut MergedRecord, from: MergedRecord) {
    if from.identity.is_some() {
        into.identity = from.identity;
    }
    for (month, metrics) in from.months {
        into.months.entry(month).or_default().merge_from(metrics);
    }
}
