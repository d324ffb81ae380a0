//! Daily time series with the previous period overlaid on current labels

use crate::analytics::period::ResolvedPeriods;
use crate::models::CallEvent;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Label format for a calendar day
const DAY_LABEL_FORMAT: &str = "%m/%d";

/// One day on the shared x-axis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    pub label: String,
    pub date: NaiveDate,
    pub current: f64,
    pub previous: f64,
}

/// Per-day minutes and call counts for both periods
///
/// Events whose day label is not on the axis are not counted anywhere; the
/// `dropped_*` fields report how many were left out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    pub minutes: Vec<Bucket>,
    pub counts: Vec<Bucket>,
    pub dropped_current: usize,
    pub dropped_previous: usize,
}

/// Builds daily series in a reporting time zone
#[derive(Debug, Clone)]
pub struct TimeSeriesBuilder {
    tz: Tz,
}

#[derive(Default, Clone, Copy)]
struct DayTotals {
    secs: i64,
    calls: u64,
}

impl TimeSeriesBuilder {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Calendar day of `ts` in the reporting zone
    pub fn day_of(&self, ts: DateTime<Utc>) -> NaiveDate {
        ts.with_timezone(&self.tz).date_naive()
    }

    /// Axis label for `ts`
    pub fn day_label(&self, ts: DateTime<Utc>) -> String {
        self.day_of(ts).format(DAY_LABEL_FORMAT).to_string()
    }

    /// The axis: `span_days` days ending on the day of `current.end`, oldest first
    ///
    /// The axis stops at the first representable calendar day.
    pub fn axis(&self, periods: &ResolvedPeriods) -> Vec<NaiveDate> {
        let last = self.day_of(periods.current.end);
        let first = last
            .checked_sub_signed(Duration::days(periods.span_days.max(1) - 1))
            .unwrap_or(NaiveDate::MIN);
        first.iter_days().take_while(|day| *day <= last).collect()
    }

    pub fn build(
        &self,
        periods: &ResolvedPeriods,
        current: &[&CallEvent],
        previous: &[&CallEvent],
    ) -> TimeSeries {
        let axis = self.axis(periods);
        let index: HashMap<String, usize> = axis
            .iter()
            .enumerate()
            .map(|(i, day)| (day.format(DAY_LABEL_FORMAT).to_string(), i))
            .collect();

        let mut cur = vec![DayTotals::default(); axis.len()];
        let mut prev = vec![DayTotals::default(); axis.len()];

        let dropped_current = accumulate(&mut cur, &index, current, |ts| Some(self.day_label(ts)));

        // Previous events move forward one span so they share labels with
        // their counterparts in the current period
        let shift = periods.span();
        let dropped_previous =
            accumulate(&mut prev, &index, previous, |ts| {
                ts.checked_add_signed(shift).map(|shifted| self.day_label(shifted))
            });

        if dropped_current > 0 || dropped_previous > 0 {
            tracing::debug!(
                dropped_current,
                dropped_previous,
                "Events fell outside the time series axis"
            );
        }

        let bucket = |day: &NaiveDate, c: f64, p: f64| Bucket {
            label: day.format(DAY_LABEL_FORMAT).to_string(),
            date: *day,
            current: c,
            previous: p,
        };

        let minutes = axis
            .iter()
            .enumerate()
            .map(|(i, day)| bucket(day, to_minutes(cur[i].secs), to_minutes(prev[i].secs)))
            .collect();

        let counts = axis
            .iter()
            .enumerate()
            .map(|(i, day)| bucket(day, cur[i].calls as f64, prev[i].calls as f64))
            .collect();

        TimeSeries {
            minutes,
            counts,
            dropped_current,
            dropped_previous,
        }
    }
}

impl Default for TimeSeriesBuilder {
    fn default() -> Self {
        Self::new(Tz::UTC)
    }
}

/// Add events into their day slots, returning how many had no slot
fn accumulate<F>(
    slots: &mut [DayTotals],
    index: &HashMap<String, usize>,
    events: &[&CallEvent],
    label_of: F,
) -> usize
where
    F: Fn(DateTime<Utc>) -> Option<String>,
{
    let mut dropped = 0;

    for event in events {
        let Some(ts) = event.start_timestamp else {
            continue;
        };

        match label_of(ts).and_then(|label| index.get(&label)) {
            Some(&i) => {
                slots[i].secs = slots[i].secs.saturating_add(event.duration_or_zero().max(0));
                slots[i].calls += 1;
            }
            None => dropped += 1,
        }
    }

    dropped
}

/// Seconds to minutes, rounded to one decimal
fn to_minutes(secs: i64) -> f64 {
    (secs as f64 / 60.0 * 10.0).round() / 10.0
}
