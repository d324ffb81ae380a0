//! Partitioning of events into current and previous subsets

use crate::analytics::period::ResolvedPeriods;
use crate::models::CallEvent;

/// Events split by period membership
///
/// Borrowed from the caller's slice; input order is preserved in both halves.
#[derive(Debug, Clone, Default)]
pub struct PartitionedEvents<'a> {
    pub current: Vec<&'a CallEvent>,
    pub previous: Vec<&'a CallEvent>,
    /// Events with no start timestamp
    pub untimed: usize,
}

/// Split `events` into the current and previous periods
///
/// Events outside both periods, or without a timestamp, belong to neither.
pub fn partition<'a>(events: &'a [CallEvent], periods: &ResolvedPeriods) -> PartitionedEvents<'a> {
    let mut out = PartitionedEvents::default();

    for event in events {
        let Some(ts) = event.start_timestamp else {
            out.untimed += 1;
            continue;
        };

        if periods.current.contains(ts) {
            out.current.push(event);
        } else if periods.previous.contains(ts) {
            out.previous.push(event);
        }
    }

    if out.untimed > 0 {
        tracing::debug!(untimed = out.untimed, "Skipped events without a start timestamp");
    }

    out
}
