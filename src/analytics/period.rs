//! Reporting window resolution
//!
//! Turns a window selection plus a reference instant into a current period and
//! an equal-length previous period that ends exactly where the current one
//! starts.

use crate::analytics::error::{AnalyticsError, AnalyticsResult};
use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Span used when a custom window is missing one of its bounds
pub const DEFAULT_WINDOW_DAYS: u32 = 7;

/// Window selection supplied by the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ReportWindow {
    /// The last `days` days ending at "now"
    Relative { days: u32 },

    /// Explicit calendar dates, both inclusive
    Custom {
        #[serde(default)]
        start: Option<NaiveDate>,
        #[serde(default)]
        end: Option<NaiveDate>,
    },
}

impl ReportWindow {
    pub fn relative(days: u32) -> Self {
        ReportWindow::Relative { days }
    }

    pub fn custom(start: NaiveDate, end: NaiveDate) -> Self {
        ReportWindow::Custom {
            start: Some(start),
            end: Some(end),
        }
    }

    /// Short name used for metric labels
    pub fn mode(&self) -> &'static str {
        match self {
            ReportWindow::Relative { .. } => "relative",
            ReportWindow::Custom { .. } => "custom",
        }
    }
}

impl Default for ReportWindow {
    fn default() -> Self {
        ReportWindow::Relative {
            days: DEFAULT_WINDOW_DAYS,
        }
    }
}

/// Parses `7d`, `30`, or `2024-01-01,2024-01-31`
impl FromStr for ReportWindow {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> AnalyticsResult<Self> {
        let s = s.trim().to_lowercase();

        if let Some((start, end)) = s.split_once(',') {
            let start = parse_date(start.trim())?;
            let end = parse_date(end.trim())?;
            return Ok(ReportWindow::custom(start, end));
        }

        let digits = s.strip_suffix('d').unwrap_or(&s);
        digits
            .parse::<u32>()
            .map(ReportWindow::relative)
            .map_err(|_| {
                AnalyticsError::InvalidWindow(format!(
                    "unknown window format: {} (use 7d or YYYY-MM-DD,YYYY-MM-DD)",
                    s
                ))
            })
    }
}

impl fmt::Display for ReportWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportWindow::Relative { days } => write!(f, "{}d", days),
            ReportWindow::Custom { start, end } => {
                let show = |d: &Option<NaiveDate>| {
                    d.map(|d| d.to_string()).unwrap_or_else(|| "?".to_string())
                };
                write!(f, "{},{}", show(start), show(end))
            }
        }
    }
}

/// A half-open time interval `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Period {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Whether `ts` falls inside the period
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && ts < self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// Current and comparison periods of identical length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedPeriods {
    pub current: Period,
    pub previous: Period,
    /// Length of each period in whole days
    pub span_days: i64,
}

impl ResolvedPeriods {
    pub fn span(&self) -> Duration {
        Duration::days(self.span_days)
    }
}

/// Resolves window selections against a reporting time zone
#[derive(Debug, Clone)]
pub struct PeriodResolver {
    tz: Tz,
    default_days: u32,
}

impl PeriodResolver {
    pub fn new(tz: Tz, default_days: u32) -> Self {
        Self {
            tz,
            default_days: default_days.max(1),
        }
    }

    /// Resolve a window relative to `now`
    pub fn resolve(&self, window: &ReportWindow, now: DateTime<Utc>) -> ResolvedPeriods {
        match window {
            ReportWindow::Relative { days } => relative(now, i64::from((*days).max(1))),
            ReportWindow::Custom {
                start: Some(start),
                end: Some(end),
            } => self.custom(*start, *end),
            ReportWindow::Custom { .. } => {
                tracing::debug!(
                    default_days = self.default_days,
                    "Custom window missing a bound, using default span"
                );
                relative(now, i64::from(self.default_days))
            }
        }
    }

    fn custom(&self, start_date: NaiveDate, end_date: NaiveDate) -> ResolvedPeriods {
        let end = end_of_day(&self.tz, end_date);

        // An inverted range collapses to the end date's own day
        let start = if end_date < start_date {
            tracing::debug!(%start_date, %end_date, "Inverted custom window clamped to one day");
            start_of_day(&self.tz, end_date)
        } else {
            start_of_day(&self.tz, start_date)
        };

        let millis = (end - start).num_milliseconds() as f64;
        let span_days = ((millis / 86_400_000.0).round() as i64).max(1);

        let current = Period::new(start, end);
        let previous = Period::new(earlier(start, Duration::days(span_days)), start);

        ResolvedPeriods {
            current,
            previous,
            span_days,
        }
    }
}

impl Default for PeriodResolver {
    fn default() -> Self {
        Self::new(Tz::UTC, DEFAULT_WINDOW_DAYS)
    }
}

fn relative(now: DateTime<Utc>, days: i64) -> ResolvedPeriods {
    let span = Duration::days(days);
    let current = Period::new(earlier(now, span), now);
    let previous = Period::new(earlier(current.start, span), current.start);

    ResolvedPeriods {
        current,
        previous,
        span_days: days,
    }
}

fn parse_date(s: &str) -> AnalyticsResult<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| {
        AnalyticsError::InvalidWindow(format!("invalid date format: {} (use YYYY-MM-DD)", s))
    })
}

/// First instant of `date` in `tz`
pub(crate) fn start_of_day(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
    local_instant(tz, date.and_time(NaiveTime::MIN))
}

/// Last millisecond of `date` in `tz`
pub(crate) fn end_of_day(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
    let next = match date.succ_opt() {
        Some(next) => start_of_day(tz, next),
        None => later(start_of_day(tz, date), Duration::days(1)),
    };
    earlier(next, Duration::milliseconds(1))
}

/// `ts - delta`, saturating at the earliest representable instant
fn earlier(ts: DateTime<Utc>, delta: Duration) -> DateTime<Utc> {
    ts.checked_sub_signed(delta).unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// `ts + delta`, saturating at the latest representable instant
fn later(ts: DateTime<Utc>, delta: Duration) -> DateTime<Utc> {
    ts.checked_add_signed(delta).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Map a wall-clock time in `tz` to an instant, taking the earlier reading of
/// an ambiguous time and skipping forward across a DST gap
fn local_instant(tz: &Tz, naive: NaiveDateTime) -> DateTime<Utc> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        LocalResult::None => naive
            .checked_add_signed(Duration::hours(1))
            .and_then(|shifted| tz.from_local_datetime(&shifted).earliest())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| naive.and_utc()),
    }
}
