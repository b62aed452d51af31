use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Groups records by the key produced by `dimension` and sums `measure` per
/// group. Records for which `dimension` yields no key (e.g., an unparsable
/// date when bucketing by week) are skipped.
///
/// Output is sorted descending by summed value; ties break on ascending label,
/// which the grouping map already guarantees through a stable sort.
pub fn aggregate_by<R>(
    records: &[R],
    dimension: impl Fn(&R) -> Option<String>,
    measure: impl Fn(&R) -> f64,
) -> Vec<(String, f64)> {
    let mut rows = group_and_sum(records, dimension, measure);
    rows.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    rows
}

/// Like [`aggregate_by`] but ordered ascending by label instead of by value.
/// Used by the weekly report, whose consumers expect chronological buckets.
pub fn aggregate_by_label_order<R>(
    records: &[R],
    dimension: impl Fn(&R) -> Option<String>,
    measure: impl Fn(&R) -> f64,
) -> Vec<(String, f64)> {
    group_and_sum(records, dimension, measure)
}

fn group_and_sum<R>(
    records: &[R],
    dimension: impl Fn(&R) -> Option<String>,
    measure: impl Fn(&R) -> f64,
) -> Vec<(String, f64)> {
    let mut groups: BTreeMap<String, f64> = BTreeMap::new();
    for record in records {
        if let Some(key) = dimension(record) {
            *groups.entry(key).or_default() += measure(record);
        }
    }
    groups.into_iter().collect()
}

/// Rounds to 2 decimal places for display of liters. Sorting and threshold
/// comparisons always happen on the unrounded value.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
