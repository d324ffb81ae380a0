//! Summary statistics over call durations

use crate::models::CallEvent;
use serde::{Deserialize, Serialize};

/// Duration statistics for calls with a positive duration
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DurationStats {
    pub count: usize,
    pub mean: f64,
    pub p50: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
    pub max: f64,
}

impl DurationStats {
    /// Calculate statistics from events, ignoring missing and non-positive durations
    pub fn from_events(events: &[&CallEvent]) -> Self {
        let mut data: Vec<f64> = events
            .iter()
            .filter_map(|e| e.duration_secs)
            .filter(|d| *d > 0)
            .map(|d| d as f64)
            .collect();

        if data.is_empty() {
            return Self::default();
        }

        data.sort_by(f64::total_cmp);

        let count = data.len();
        Self {
            count,
            mean: data.iter().sum::<f64>() / count as f64,
            p50: percentile(&data, 50.0),
            p90: percentile(&data, 90.0),
            p95: percentile(&data, 95.0),
            p99: percentile(&data, 99.0),
            max: data[count - 1],
        }
    }
}

/// Linear-interpolated percentile of sorted data
pub fn percentile(sorted_data: &[f64], percentile: f64) -> f64 {
    if sorted_data.is_empty() {
        return 0.0;
    }

    let index = (percentile / 100.0) * (sorted_data.len() - 1) as f64;
    let lower = index.floor() as usize;
    let upper = index.ceil() as usize;

    if lower == upper {
        sorted_data[lower]
    } else {
        let weight = index - lower as f64;
        sorted_data[lower] * (1.0 - weight) + sorted_data[upper] * weight
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_percentiles() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];

        assert!((percentile(&data, 50.0) - 5.5).abs() < 0.01);
        assert!((percentile(&data, 90.0) - 9.1).abs() < 0.01);
        assert_eq!(percentile(&[], 50.0), 0.0);
    }

    #[test]
    fn test_duration_stats_skips_non_positive() {
        let events: Vec<CallEvent> = [Some(10), Some(20), Some(30), None, Some(0), Some(-4)]
            .into_iter()
            .enumerate()
            .map(|(i, d)| CallEvent {
                duration_secs: d,
                ..CallEvent::new(format!("c{}", i), Utc::now())
            })
            .collect();
        let refs: Vec<_> = events.iter().collect();

        let stats = DurationStats::from_events(&refs);

        assert_eq!(stats.count, 3);
        assert_eq!(stats.mean, 20.0);
        assert_eq!(stats.p50, 20.0);
        assert_eq!(stats.max, 30.0);
    }

    #[test]
    fn test_empty_stats() {
        assert_eq!(DurationStats::from_events(&[]), DurationStats::default());
    }
}
