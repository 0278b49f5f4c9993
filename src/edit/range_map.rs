use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::edit::series::{EditableSeries, IndexRange};

/// What a selection means when it is applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditPolicy {
    /// Remove the selected interior.
    Cut,
    /// Remove everything outside the selection.
    Keep,
}

/// A user selection in either index space or time space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Selection {
    Index { min: f64, max: f64 },
    Time { start: NaiveDateTime, end: NaiveDateTime },
}

impl Selection {
    /// Resolve to a clamped inclusive index range on `series`. Reversed
    /// bounds are swapped; `None` when nothing of the series is selected.
    pub fn resolve(&self, series: &EditableSeries) -> Option<(usize, usize)> {
        let len = series.len();
        if len == 0 {
            return None;
        }
        let last = (len - 1) as f64;
        match *self {
            Selection::Index { min, max } => {
                if min.is_nan() || max.is_nan() {
                    return None;
                }
                let (lo, hi) = if max < min { (max, min) } else { (min, max) };
                let lo = lo.round().clamp(0.0, last) as usize;
                let hi = hi.round().clamp(0.0, last) as usize;
                Some((lo, hi))
            }
            Selection::Time { start, end } => {
                let (a, b) = if end < start { (end, start) } else { (start, end) };
                let range = series.index_range_for_timestamps(a, b);
                if range.is_empty() {
                    None
                } else {
                    Some((range.start as usize, range.end as usize))
                }
            }
        }
    }
}

/// Cuts needed to apply `selection` under `policy`, in the order they must
/// run. For `Keep` the tail goes first: removing the head would shift the
/// tail bounds.
pub fn plan(selection: &Selection, policy: EditPolicy, series: &EditableSeries) -> Vec<IndexRange> {
    let Some((lo, hi)) = selection.resolve(series) else {
        return Vec::new();
    };
    match policy {
        EditPolicy::Cut => vec![IndexRange::new(lo, hi)],
        EditPolicy::Keep => {
            let last = series.len() - 1;
            let mut cuts = Vec::with_capacity(2);
            if hi < last {
                cuts.push(IndexRange::new(hi + 1, last));
            }
            if lo > 0 {
                cuts.push(IndexRange::new(0, lo - 1));
            }
            cuts
        }
    }
}

/// Plan and apply a selection. Returns the ranges actually removed.
pub fn apply(selection: &Selection, policy: EditPolicy, series: &mut EditableSeries) -> Vec<IndexRange> {
    plan(selection, policy, series)
        .into_iter()
        .filter_map(|r| series.cut_range(r.start, r.end))
        .collect()
}
