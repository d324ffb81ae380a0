//! Categorical breakdowns: end reasons and call direction
//!
//! Each breakdown is a pure `classify` function feeding the shared
//! [`CategoryAggregator`], which counts, ranks, and colors the groups.

use crate::models::{CallDirection, CallEvent};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Presentation colors, assigned in rank order and reused cyclically
pub const DEFAULT_PALETTE: &[&str] = &[
    "#3b82f6", "#10b981", "#f59e0b", "#ef4444", "#8b5cf6", "#ec4899", "#06b6d4", "#84cc16",
];

/// Label used when no end-reason source yields a value
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Ordered end-reason sources; the first non-blank value wins
pub const END_REASON_SOURCES: &[fn(&CallEvent) -> Option<&str>] =
    &[disconnection_reason, status];

fn disconnection_reason(event: &CallEvent) -> Option<&str> {
    event.disconnection_reason.as_deref()
}

fn status(event: &CallEvent) -> Option<&str> {
    event.status.as_deref()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryGroup {
    pub label: String,
    pub count: u64,
    /// 1-based position after sorting
    pub rank: usize,
    pub color: String,
}

/// Counts events per label and orders the groups
#[derive(Debug, Clone)]
pub struct CategoryAggregator {
    palette: Vec<String>,
}

impl CategoryAggregator {
    pub fn new(palette: Vec<String>) -> Self {
        let palette = if palette.is_empty() {
            DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect()
        } else {
            palette
        };
        Self { palette }
    }

    /// Group `events` by `classify`
    ///
    /// Groups are sorted by descending count; equal counts keep the order in
    /// which their label first appeared.
    pub fn aggregate<F>(&self, events: &[&CallEvent], classify: F) -> Vec<CategoryGroup>
    where
        F: Fn(&CallEvent) -> String,
    {
        let mut order: Vec<(String, u64)> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for event in events {
            let label = classify(event);
            match index.get(&label) {
                Some(&i) => order[i].1 += 1,
                None => {
                    index.insert(label.clone(), order.len());
                    order.push((label, 1));
                }
            }
        }

        // Stable sort keeps first-seen order among ties
        order.sort_by(|a, b| b.1.cmp(&a.1));

        order
            .into_iter()
            .enumerate()
            .map(|(i, (label, count))| CategoryGroup {
                label,
                count,
                rank: i + 1,
                color: self.palette[i % self.palette.len()].clone(),
            })
            .collect()
    }

    /// Breakdown by why calls ended
    pub fn end_reasons(&self, events: &[&CallEvent]) -> Vec<CategoryGroup> {
        self.aggregate(events, classify_end_reason)
    }

    /// Inbound vs outbound split
    ///
    /// Unknown is reported only when no call has a known direction.
    pub fn directions(&self, events: &[&CallEvent]) -> Vec<CategoryGroup> {
        let groups = self.aggregate(events, classify_direction);

        let has_known = groups
            .iter()
            .any(|g| g.label != CallDirection::Unknown.label());
        if !has_known {
            return groups;
        }

        let mut known: Vec<CategoryGroup> = groups
            .into_iter()
            .filter(|g| g.label != CallDirection::Unknown.label())
            .collect();
        for (i, group) in known.iter_mut().enumerate() {
            group.rank = i + 1;
            group.color = self.palette[i % self.palette.len()].clone();
        }
        known
    }
}

impl Default for CategoryAggregator {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

/// End-reason label for an event
pub fn classify_end_reason(event: &CallEvent) -> String {
    END_REASON_SOURCES
        .iter()
        .filter_map(|source| source(event))
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(normalize_label)
        .unwrap_or_else(|| UNKNOWN_LABEL.to_string())
}

/// Direction label for an event
pub fn classify_direction(event: &CallEvent) -> String {
    event.direction.label().to_string()
}

/// `agent_hangup` -> `Agent Hangup`
pub fn normalize_label(raw: &str) -> String {
    raw.replace('_', " ")
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
