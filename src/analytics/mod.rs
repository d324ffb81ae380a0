//! Call analytics: period comparison and chart-ready aggregates
//!
//! Given a flat list of call events, a reporting window, and a reference
//! instant, the engine produces everything a dashboard needs in one pass.
//!
//! # Features
//!
//! - **Period Resolution**: relative (`7d`) or custom calendar windows, each
//!   paired with an equal-length previous period
//! - **KPIs**: minutes, calls, success rate, average duration, unique callers,
//!   each with its period-over-period change
//! - **Time Series**: daily minutes and counts with the previous period
//!   overlaid on the current day labels
//! - **Distributions**: duration histogram and percentile statistics
//! - **Breakdowns**: end reasons and inbound/outbound split, ranked and colored
//! - **Heatmap**: weekday by hour activity grid
//! - **Export**: JSON and CSV
//!
//! # Example
//!
//! ```no_run
//! use call_analytics::analytics::{AnalyticsEngine, ReportWindow};
//! use call_analytics::models::CallEvent;
//! use chrono::{Duration, Utc};
//!
//! let engine = AnalyticsEngine::with_defaults();
//! let now = Utc::now();
//! let events = vec![CallEvent::new("call-1", now - Duration::hours(3)).with_duration(95)];
//!
//! let report = engine.compute(&events, &ReportWindow::relative(7), now);
//! println!("{} buckets", report.time_series.counts.len());
//! ```

mod breakdown;
mod distribution;
mod engine;
mod error;
mod export;
mod filter;
mod heatmap;
mod metrics;
mod period;
mod statistics;
mod timeseries;

pub use breakdown::{
    classify_direction, classify_end_reason, normalize_label, CategoryAggregator, CategoryGroup,
    DEFAULT_PALETTE, END_REASON_SOURCES, UNKNOWN_LABEL,
};
pub use distribution::{duration_histogram, HistogramBin, DURATION_BINS};
pub use engine::{AnalyticsConfig, AnalyticsEngine, AnalyticsReport};
pub use error::{AnalyticsError, AnalyticsResult};
pub use export::{ExportFormat, ReportExporter};
pub use filter::{partition, PartitionedEvents};
pub use heatmap::{Heatmap, HeatmapBuilder, HeatmapCell, DAYS_PER_WEEK, HOURS_PER_DAY};
pub use metrics::{
    percent_change, point_change, ChangeUnit, MetricCalculator, MetricKey, MetricResult,
    PeriodSummary, SuccessMarkers, DEFAULT_SUCCESS_MARKERS,
};
pub use period::{
    Period, PeriodResolver, ReportWindow, ResolvedPeriods, DEFAULT_WINDOW_DAYS,
};
pub use statistics::{percentile, DurationStats};
pub use timeseries::{Bucket, TimeSeries, TimeSeriesBuilder};
