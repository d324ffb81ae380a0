//! Scalar KPIs per period and their period-over-period change

use crate::models::CallEvent;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use strum::{Display, EnumString};

/// Tokens that mark an evaluation as successful
pub const DEFAULT_SUCCESS_MARKERS: &[&str] = &[
    "success",
    "successful",
    "succeeded",
    "true",
    "yes",
    "pass",
    "passed",
];

/// Identifies a KPI
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, EnumString, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MetricKey {
    TotalMinutes,
    CallCount,
    SuccessRate,
    AverageDurationSecs,
    UniqueCallers,
}

impl MetricKey {
    pub fn label(&self) -> &'static str {
        match self {
            MetricKey::TotalMinutes => "Total Minutes",
            MetricKey::CallCount => "Total Calls",
            MetricKey::SuccessRate => "Success Rate",
            MetricKey::AverageDurationSecs => "Avg Duration",
            MetricKey::UniqueCallers => "Unique Callers",
        }
    }

    /// How the change between periods is expressed
    pub fn change_unit(&self) -> ChangeUnit {
        match self {
            MetricKey::SuccessRate => ChangeUnit::PercentagePoints,
            _ => ChangeUnit::Percent,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChangeUnit {
    /// Relative change, `(cur - prev) / prev * 100`
    Percent,
    /// Absolute difference of two percentages
    PercentagePoints,
}

/// A KPI for both periods
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricResult {
    pub key: MetricKey,
    pub label: String,
    pub current: f64,
    pub previous: f64,
    pub change: f64,
    pub change_unit: ChangeUnit,
}

/// Raw KPI values for one subset
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodSummary {
    pub total_minutes: u64,
    pub call_count: u64,
    /// Percentage in [0, 100]
    pub success_rate: f64,
    pub average_duration_secs: u64,
    pub unique_callers: u64,
}

impl PeriodSummary {
    fn value(&self, key: MetricKey) -> f64 {
        match key {
            MetricKey::TotalMinutes => self.total_minutes as f64,
            MetricKey::CallCount => self.call_count as f64,
            MetricKey::SuccessRate => self.success_rate,
            MetricKey::AverageDurationSecs => self.average_duration_secs as f64,
            MetricKey::UniqueCallers => self.unique_callers as f64,
        }
    }
}

/// Case-insensitive whole-word matcher for success markers
#[derive(Debug, Clone)]
pub struct SuccessMarkers {
    markers: HashSet<String>,
}

impl SuccessMarkers {
    pub fn new<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            markers: markers
                .into_iter()
                .map(|m| m.as_ref().trim().to_lowercase())
                .filter(|m| !m.is_empty())
                .collect(),
        }
    }

    /// Whether the evaluation text contains any marker as a whole word
    pub fn matches(&self, text: &str) -> bool {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|word| !word.is_empty())
            .any(|word| self.markers.contains(&word.to_lowercase()))
    }
}

impl Default for SuccessMarkers {
    fn default() -> Self {
        Self::new(DEFAULT_SUCCESS_MARKERS)
    }
}

/// Computes KPIs for the current and previous subsets
#[derive(Debug, Clone, Default)]
pub struct MetricCalculator {
    markers: SuccessMarkers,
}

impl MetricCalculator {
    pub fn new(markers: SuccessMarkers) -> Self {
        Self { markers }
    }

    /// Summarize one subset
    pub fn summarize(&self, events: &[&CallEvent]) -> PeriodSummary {
        let call_count = events.len() as u64;

        let total_secs = events
            .iter()
            .map(|e| e.duration_or_zero().max(0))
            .fold(0i64, i64::saturating_add);
        let total_minutes = (total_secs as f64 / 60.0).round() as u64;

        let successes = events
            .iter()
            .filter(|e| {
                e.evaluation
                    .as_deref()
                    .is_some_and(|text| self.markers.matches(text))
            })
            .count();
        let success_rate = ratio(successes as f64, call_count as f64) * 100.0;

        let positive: Vec<i64> = events
            .iter()
            .filter_map(|e| e.duration_secs)
            .filter(|d| *d > 0)
            .collect();
        let average_duration_secs =
            ratio(positive.iter().map(|d| *d as f64).sum(), positive.len() as f64).round() as u64;

        let unique_callers = events
            .iter()
            .filter_map(|e| e.from_number.as_deref())
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .collect::<HashSet<_>>()
            .len() as u64;

        PeriodSummary {
            total_minutes,
            call_count,
            success_rate,
            average_duration_secs,
            unique_callers,
        }
    }

    /// Compute every KPI with its change against the previous subset
    pub fn compute(&self, current: &[&CallEvent], previous: &[&CallEvent]) -> Vec<MetricResult> {
        let cur = self.summarize(current);
        let prev = self.summarize(previous);

        [
            MetricKey::TotalMinutes,
            MetricKey::CallCount,
            MetricKey::SuccessRate,
            MetricKey::AverageDurationSecs,
            MetricKey::UniqueCallers,
        ]
        .into_iter()
        .map(|key| {
            let (c, p) = (cur.value(key), prev.value(key));
            let change = match key.change_unit() {
                ChangeUnit::Percent => percent_change(c, p),
                ChangeUnit::PercentagePoints => point_change(c, p, prev.call_count),
            };

            MetricResult {
                key,
                label: key.label().to_string(),
                current: c,
                previous: p,
                change,
                change_unit: key.change_unit(),
            }
        })
        .collect()
    }
}

/// Relative change in percent, zero when there is no baseline
pub fn percent_change(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        return 0.0;
    }
    (current - previous) / previous * 100.0
}

/// Percentage-point difference, zero when the baseline subset was empty
pub fn point_change(current: f64, previous: f64, previous_count: u64) -> f64 {
    if previous_count == 0 {
        return 0.0;
    }
    current - previous
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn call(duration: Option<i64>) -> CallEvent {
        CallEvent {
            duration_secs: duration,
            ..CallEvent::new("c", Utc::now())
        }
    }

    fn find(results: &[MetricResult], key: MetricKey) -> &MetricResult {
        results.iter().find(|r| r.key == key).unwrap()
    }

    #[test]
    fn test_percent_change_zero_baseline() {
        assert_eq!(percent_change(0.0, 0.0), 0.0);
        assert_eq!(percent_change(42.0, 0.0), 0.0);
        assert_eq!(percent_change(150.0, 100.0), 50.0);
        assert_eq!(percent_change(50.0, 100.0), -50.0);
    }

    #[test]
    fn test_point_change() {
        assert_eq!(point_change(75.0, 50.0, 4), 25.0);
        assert_eq!(point_change(75.0, 0.0, 0), 0.0);
        assert_eq!(point_change(0.0, 50.0, 2), -50.0);
    }

    #[test]
    fn test_success_markers() {
        let markers = SuccessMarkers::default();
        assert!(markers.matches("Call was SUCCESSFUL"));
        assert!(markers.matches("call_successful: true"));
        assert!(markers.matches("Yes"));
        assert!(!markers.matches("unsuccessful"));
        assert!(!markers.matches("customer hung up"));
    }

    #[test]
    fn test_summary_values() {
        let a = call(Some(90)).with_evaluation("success").with_from_number("+1555");
        let b = call(Some(30)).with_evaluation("failed").with_from_number("+1555");
        let c = call(None).with_from_number("+1666");
        let d = call(Some(0));
        let events = vec![&a, &b, &c, &d];

        let summary = MetricCalculator::default().summarize(&events);

        assert_eq!(summary.call_count, 4);
        assert_eq!(summary.total_minutes, 2);
        assert_eq!(summary.success_rate, 25.0);
        assert_eq!(summary.average_duration_secs, 60);
        assert_eq!(summary.unique_callers, 2);
    }

    #[test]
    fn test_huge_durations_do_not_overflow() {
        let a = call(Some(i64::MAX));
        let b = call(Some(i64::MAX));

        let summary = MetricCalculator::default().summarize(&[&a, &b]);

        assert_eq!(summary.call_count, 2);
        assert!(summary.total_minutes > 0);
        assert!(summary.average_duration_secs > 0);
    }

    #[test]
    fn test_empty_summary_is_zero() {
        let summary = MetricCalculator::default().summarize(&[]);
        assert_eq!(summary, PeriodSummary::default());
    }

    #[test]
    fn test_compute_changes() {
        let cur_a = call(Some(120)).with_evaluation("success");
        let cur_b = call(Some(120)).with_evaluation("success");
        let prev_a = call(Some(120)).with_evaluation("success");
        let prev_b = call(Some(120)).with_evaluation("no");

        let results =
            MetricCalculator::default().compute(&[&cur_a, &cur_b], &[&prev_a, &prev_b]);

        let count = find(&results, MetricKey::CallCount);
        assert_eq!(count.change, 0.0);

        let rate = find(&results, MetricKey::SuccessRate);
        assert_eq!(rate.current, 100.0);
        assert_eq!(rate.previous, 50.0);
        assert_eq!(rate.change, 50.0);
        assert_eq!(rate.change_unit, ChangeUnit::PercentagePoints);

        let minutes = find(&results, MetricKey::TotalMinutes);
        assert_eq!(minutes.current, 4.0);
        assert_eq!(minutes.change_unit, ChangeUnit::Percent);
    }

    #[test]
    fn test_rate_change_zero_when_previous_empty() {
        let cur = call(Some(10)).with_evaluation("success");
        let results = MetricCalculator::default().compute(&[&cur], &[]);

        for result in &results {
            assert_eq!(result.change, 0.0, "{} should not change from an empty baseline", result.key);
        }
    }
}
