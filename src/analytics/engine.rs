//! Aggregation engine: events + window + now -> report

use crate::analytics::breakdown::{CategoryAggregator, CategoryGroup, DEFAULT_PALETTE};
use crate::analytics::distribution::{duration_histogram, HistogramBin};
use crate::analytics::error::{AnalyticsError, AnalyticsResult};
use crate::analytics::filter::partition;
use crate::analytics::heatmap::{Heatmap, HeatmapBuilder};
use crate::analytics::metrics::{
    MetricCalculator, MetricResult, SuccessMarkers, DEFAULT_SUCCESS_MARKERS,
};
use crate::analytics::period::{PeriodResolver, ReportWindow, ResolvedPeriods, DEFAULT_WINDOW_DAYS};
use crate::analytics::statistics::DurationStats;
use crate::analytics::timeseries::{TimeSeries, TimeSeriesBuilder};
use crate::metrics::{
    ANALYTICS_COMPUTATIONS_TOTAL, ANALYTICS_COMPUTE_DURATION_SECONDS, ANALYTICS_EVENTS_TOTAL,
    TIMESERIES_DROPPED_EVENTS_TOTAL,
};
use crate::models::CallEvent;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Configuration for the analytics engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// IANA zone used for calendar days, weekdays, and hours
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Span used when a custom window lacks a bound
    #[serde(default = "default_window_days")]
    pub default_window_days: u32,

    /// Words that mark an evaluation as successful
    #[serde(default = "default_success_markers")]
    pub success_markers: Vec<String>,

    /// Breakdown colors, in rank order
    #[serde(default = "default_palette")]
    pub palette: Vec<String>,

    /// Run independent builders on the rayon pool
    #[serde(default = "default_true")]
    pub parallel_builders: bool,
}

impl AnalyticsConfig {
    /// Parse the configured time zone
    pub fn tz(&self) -> AnalyticsResult<Tz> {
        self.timezone.parse::<Tz>().map_err(|e| {
            AnalyticsError::InvalidConfiguration(format!(
                "unknown timezone '{}': {}",
                self.timezone, e
            ))
        })
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            default_window_days: default_window_days(),
            success_markers: default_success_markers(),
            palette: default_palette(),
            parallel_builders: true,
        }
    }
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_window_days() -> u32 {
    DEFAULT_WINDOW_DAYS
}

fn default_success_markers() -> Vec<String> {
    DEFAULT_SUCCESS_MARKERS.iter().map(|m| m.to_string()).collect()
}

fn default_palette() -> Vec<String> {
    DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect()
}

fn default_true() -> bool {
    true
}

/// Complete aggregation result for one window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsReport {
    pub window: ReportWindow,
    pub periods: ResolvedPeriods,
    pub generated_at: DateTime<Utc>,
    pub metrics: Vec<MetricResult>,
    pub time_series: TimeSeries,
    pub duration_histogram: Vec<HistogramBin>,
    pub duration_stats: DurationStats,
    pub end_reason_breakdown: Vec<CategoryGroup>,
    pub direction_split: Vec<CategoryGroup>,
    pub heatmap: Heatmap,
}

/// Main analytics engine
///
/// Stateless apart from its configuration; one instance can serve any number
/// of concurrent callers.
#[derive(Debug, Clone)]
pub struct AnalyticsEngine {
    parallel: bool,
    resolver: PeriodResolver,
    calculator: MetricCalculator,
    time_series: TimeSeriesBuilder,
    categories: CategoryAggregator,
    heatmap: HeatmapBuilder,
}

impl AnalyticsEngine {
    /// Create a new analytics engine
    pub fn new(config: AnalyticsConfig) -> AnalyticsResult<Self> {
        let tz = config.tz()?;

        Ok(Self {
            parallel: config.parallel_builders,
            resolver: PeriodResolver::new(tz, config.default_window_days),
            calculator: MetricCalculator::new(SuccessMarkers::new(&config.success_markers)),
            time_series: TimeSeriesBuilder::new(tz),
            categories: CategoryAggregator::new(config.palette),
            heatmap: HeatmapBuilder::new(tz),
        })
    }

    /// Create with default configuration
    pub fn with_defaults() -> Self {
        let config = AnalyticsConfig::default();
        Self {
            parallel: config.parallel_builders,
            resolver: PeriodResolver::default(),
            calculator: MetricCalculator::default(),
            time_series: TimeSeriesBuilder::default(),
            categories: CategoryAggregator::default(),
            heatmap: HeatmapBuilder::default(),
        }
    }

    /// Resolve a window without computing anything else
    pub fn resolve(&self, window: &ReportWindow, now: DateTime<Utc>) -> ResolvedPeriods {
        self.resolver.resolve(window, now)
    }

    /// Compute the full report for `window` as of `now`
    #[tracing::instrument(skip(self, events, window), fields(events = events.len(), window = %window))]
    pub fn compute(
        &self,
        events: &[CallEvent],
        window: &ReportWindow,
        now: DateTime<Utc>,
    ) -> AnalyticsReport {
        let started = Instant::now();

        let periods = self.resolver.resolve(window, now);
        let parts = partition(events, &periods);
        let (current, previous) = (&parts.current, &parts.previous);

        tracing::debug!(
            current = current.len(),
            previous = previous.len(),
            untimed = parts.untimed,
            span_days = periods.span_days,
            "Partitioned events"
        );

        let p = self.parallel;
        let ((metrics, time_series), ((histogram, duration_stats), (breakdowns, heatmap))) =
            join_if(
                p,
                || {
                    join_if(
                        p,
                        || self.calculator.compute(current, previous),
                        || self.time_series.build(&periods, current, previous),
                    )
                },
                || {
                    join_if(
                        p,
                        || {
                            (
                                duration_histogram(current),
                                DurationStats::from_events(current),
                            )
                        },
                        || {
                            join_if(
                                p,
                                || {
                                    (
                                        self.categories.end_reasons(current),
                                        self.categories.directions(current),
                                    )
                                },
                                || self.heatmap.build(current),
                            )
                        },
                    )
                },
            );
        let (end_reason_breakdown, direction_split) = breakdowns;

        if time_series.dropped_current + time_series.dropped_previous > 0 {
            tracing::warn!(
                dropped_current = time_series.dropped_current,
                dropped_previous = time_series.dropped_previous,
                "Time series omitted events outside its day axis"
            );
        }

        record_metrics(window, &parts.current, &parts.previous, parts.untimed, &time_series, started);

        AnalyticsReport {
            window: window.clone(),
            periods,
            generated_at: now,
            metrics,
            time_series,
            duration_histogram: histogram,
            duration_stats,
            end_reason_breakdown,
            direction_split,
            heatmap,
        }
    }

    /// Compute as of the current wall-clock time
    pub fn compute_now(&self, events: &[CallEvent], window: &ReportWindow) -> AnalyticsReport {
        self.compute(events, window, Utc::now())
    }
}

impl Default for AnalyticsEngine {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Run two closures, on the rayon pool when `parallel` is set
fn join_if<A, B, RA, RB>(parallel: bool, a: A, b: B) -> (RA, RB)
where
    A: FnOnce() -> RA + Send,
    B: FnOnce() -> RB + Send,
    RA: Send,
    RB: Send,
{
    if parallel {
        rayon::join(a, b)
    } else {
        (a(), b())
    }
}

fn record_metrics(
    window: &ReportWindow,
    current: &[&CallEvent],
    previous: &[&CallEvent],
    untimed: usize,
    time_series: &TimeSeries,
    started: Instant,
) {
    let mode = window.mode();
    ANALYTICS_COMPUTATIONS_TOTAL.with_label_values(&[mode]).inc();
    ANALYTICS_COMPUTE_DURATION_SECONDS
        .with_label_values(&[mode])
        .observe(started.elapsed().as_secs_f64());

    ANALYTICS_EVENTS_TOTAL
        .with_label_values(&["current"])
        .inc_by(current.len() as f64);
    ANALYTICS_EVENTS_TOTAL
        .with_label_values(&["previous"])
        .inc_by(previous.len() as f64);
    ANALYTICS_EVENTS_TOTAL
        .with_label_values(&["untimed"])
        .inc_by(untimed as f64);

    TIMESERIES_DROPPED_EVENTS_TOTAL
        .with_label_values(&["current"])
        .inc_by(time_series.dropped_current as f64);
    TIMESERIES_DROPPED_EVENTS_TOTAL
        .with_label_values(&["previous"])
        .inc_by(time_series.dropped_previous as f64);
}
