//! Shared fixtures for integration tests

#![allow(dead_code)]

use call_analytics::models::{CallDirection, CallEvent};
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::HashMap;

/// Fixed reference instant: Friday 2024-03-15 12:00 UTC
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap()
}

/// Midnight UTC at the start of `fixed_now()`'s day
pub fn day0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap()
}

/// A timed call with a duration
pub fn call_at(id: &str, ts: DateTime<Utc>, duration_secs: i64) -> CallEvent {
    CallEvent::new(id, ts).with_duration(duration_secs)
}

/// A realistic mix of calls spread over the last two weeks
pub fn sample_events() -> Vec<CallEvent> {
    let now = fixed_now();
    let reasons = ["user_hangup", "agent_hangup", "voicemail", "dial_no_answer"];
    let evaluations = ["success", "failed", "Call was successful", "no answer"];

    (0..120)
        .map(|i| {
            let ts = now - Duration::hours(i * 2 + 1);
            let mut event = call_at(&format!("call-{}", i), ts, (i * 17) % 900)
                .with_evaluation(evaluations[i as usize % evaluations.len()])
                .with_from_number(format!("+1555000{:04}", i % 37))
                .with_direction(if i % 3 == 0 {
                    CallDirection::Outbound
                } else {
                    CallDirection::Inbound
                });

            // Every fifth call only has a status
            if i % 5 == 0 {
                event = event.with_status("ended");
            } else {
                event = event.with_disconnection_reason(reasons[i as usize % reasons.len()]);
            }
            event
        })
        .collect()
}

/// Parse Prometheus exposition format into metric name -> lines
pub fn parse_prometheus_output(output: &str) -> HashMap<String, Vec<String>> {
    let mut metrics = HashMap::new();
    let mut current_metric = String::new();

    for line in output.lines() {
        let line = line.trim();

        if line.is_empty() {
            continue;
        }

        if line.starts_with("# HELP") || line.starts_with("# TYPE") {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() >= 3 {
                current_metric = parts[2].to_string();
                metrics
                    .entry(current_metric.clone())
                    .or_insert_with(Vec::new)
                    .push(line.to_string());
            }
        } else if !line.starts_with('#') && !current_metric.is_empty() {
            metrics
                .entry(current_metric.clone())
                .or_insert_with(Vec::new)
                .push(line.to_string());
        }
    }

    metrics
}

/// Check if a metric exists in Prometheus output
pub fn metric_exists(output: &str, metric_name: &str) -> bool {
    output.lines().any(|line| {
        line.starts_with(&format!("# HELP {}", metric_name))
            || line.starts_with(&format!("# TYPE {}", metric_name))
            || line.starts_with(metric_name)
    })
}
