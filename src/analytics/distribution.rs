//! Call duration histogram

use crate::models::CallEvent;
use serde::{Deserialize, Serialize};

/// Bin edges in seconds: `(label, lower inclusive, upper exclusive)`
///
/// Bins are contiguous and ascending; the last one has no upper bound.
pub const DURATION_BINS: &[(&str, u64, Option<u64>)] = &[
    ("0-30s", 0, Some(30)),
    ("30-60s", 30, Some(60)),
    ("1-2m", 60, Some(120)),
    ("2-5m", 120, Some(300)),
    ("5-10m", 300, Some(600)),
    ("10m+", 600, None),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub label: String,
    pub lower: u64,
    /// `None` for the open-ended last bin
    pub upper: Option<u64>,
    pub count: u64,
}

impl HistogramBin {
    /// Whether `value` falls in `[lower, upper)`
    pub fn contains(&self, value: u64) -> bool {
        value >= self.lower && self.upper.is_none_or(|upper| value < upper)
    }
}

/// Bucket call durations into [`DURATION_BINS`]
///
/// Missing and negative durations count as zero, so every event lands in
/// exactly one bin.
pub fn duration_histogram(events: &[&CallEvent]) -> Vec<HistogramBin> {
    let mut bins: Vec<HistogramBin> = DURATION_BINS
        .iter()
        .map(|(label, lower, upper)| HistogramBin {
            label: (*label).to_string(),
            lower: *lower,
            upper: *upper,
            count: 0,
        })
        .collect();

    for event in events {
        let secs = event.duration_or_zero().max(0) as u64;
        if let Some(bin) = bins.iter_mut().find(|bin| bin.contains(secs)) {
            bin.count += 1;
        }
    }

    bins
}
