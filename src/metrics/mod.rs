//! Prometheus metrics for the call analytics service.
//!
//! Covers HTTP traffic, analytics computations, and error tracking. All
//! collectors live in one process-wide registry exposed at `GET /metrics`.
//!
//! # Example
//! ```no_run
//! use call_analytics::metrics::{init_metrics, ANALYTICS_COMPUTATIONS_TOTAL};
//!
//! init_metrics().unwrap();
//! ANALYTICS_COMPUTATIONS_TOTAL.with_label_values(&["relative"]).inc();
//! ```

mod middleware;

pub use middleware::track_metrics;

use lazy_static::lazy_static;
use prometheus::core::Collector;
use prometheus::{CounterVec, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry};

const NAMESPACE: &str = "call_analytics";

lazy_static! {
    /// Global Prometheus registry for all metrics
    pub static ref PROMETHEUS_REGISTRY: Registry = Registry::new();

    // ============================================================================
    // HTTP Metrics
    // ============================================================================

    /// Total number of HTTP requests received
    ///
    /// Labels: method, path, status_code
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests")
            .namespace(NAMESPACE),
        &["method", "path", "status_code"]
    ).expect("Failed to create HTTP_REQUESTS_TOTAL metric");

    /// HTTP request duration in seconds
    ///
    /// Labels: method, path
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request duration in seconds"
        )
        .namespace(NAMESPACE)
        .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["method", "path"]
    ).expect("Failed to create HTTP_REQUEST_DURATION_SECONDS metric");

    // ============================================================================
    // Analytics Metrics
    // ============================================================================

    /// Total number of analytics computations
    ///
    /// Labels: mode (relative, custom)
    pub static ref ANALYTICS_COMPUTATIONS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("analytics_computations_total", "Total number of analytics computations")
            .namespace(NAMESPACE),
        &["mode"]
    ).expect("Failed to create ANALYTICS_COMPUTATIONS_TOTAL metric");

    /// Analytics computation duration in seconds
    ///
    /// Labels: mode
    pub static ref ANALYTICS_COMPUTE_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "analytics_compute_duration_seconds",
            "Analytics computation duration in seconds"
        )
        .namespace(NAMESPACE)
        .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
        &["mode"]
    ).expect("Failed to create ANALYTICS_COMPUTE_DURATION_SECONDS metric");

    /// Events seen by the engine
    ///
    /// Labels: subset (current, previous, untimed)
    pub static ref ANALYTICS_EVENTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("analytics_events_total", "Events seen by the analytics engine")
            .namespace(NAMESPACE),
        &["subset"]
    ).expect("Failed to create ANALYTICS_EVENTS_TOTAL metric");

    /// Events left out of the time series because their day was off the axis
    ///
    /// Labels: series (current, previous)
    pub static ref TIMESERIES_DROPPED_EVENTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(
            "timeseries_dropped_events_total",
            "Events omitted from the daily time series"
        )
        .namespace(NAMESPACE),
        &["series"]
    ).expect("Failed to create TIMESERIES_DROPPED_EVENTS_TOTAL metric");

    // ============================================================================
    // Error Metrics
    // ============================================================================

    /// Total number of errors
    ///
    /// Labels: component, error_type
    pub static ref ERRORS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("errors_total", "Total number of errors")
            .namespace(NAMESPACE),
        &["component", "error_type"]
    ).expect("Failed to create ERRORS_TOTAL metric");

    // ============================================================================
    // System Metrics
    // ============================================================================

    pub static ref BUILD_INFO: GaugeVec = GaugeVec::new(
        Opts::new("build_info", "Application build information")
            .namespace(NAMESPACE),
        &["version", "git_commit"]
    ).expect("Failed to create BUILD_INFO metric");
}

/// Register every collector with the global registry
///
/// Safe to call more than once; collectors that are already registered are
/// left as they are.
pub fn init_metrics() -> Result<(), prometheus::Error> {
    // HTTP metrics
    register(HTTP_REQUESTS_TOTAL.clone())?;
    register(HTTP_REQUEST_DURATION_SECONDS.clone())?;

    // Analytics metrics
    register(ANALYTICS_COMPUTATIONS_TOTAL.clone())?;
    register(ANALYTICS_COMPUTE_DURATION_SECONDS.clone())?;
    register(ANALYTICS_EVENTS_TOTAL.clone())?;
    register(TIMESERIES_DROPPED_EVENTS_TOTAL.clone())?;

    // Error and system metrics
    register(ERRORS_TOTAL.clone())?;
    register(BUILD_INFO.clone())?;

    BUILD_INFO
        .with_label_values(&[
            env!("CARGO_PKG_VERSION"),
            option_env!("GIT_COMMIT").unwrap_or("unknown"),
        ])
        .set(1.0);

    tracing::info!("Prometheus metrics initialized successfully");
    Ok(())
}

fn register<C: Collector + 'static>(collector: C) -> Result<(), prometheus::Error> {
    match PROMETHEUS_REGISTRY.register(Box::new(collector)) {
        Ok(()) | Err(prometheus::Error::AlreadyReg) => Ok(()),
        Err(e) => Err(e),
    }
}

pub fn gather_metrics() -> String {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();
    let metric_families = PROMETHEUS_REGISTRY.gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::from("# Error encoding metrics\n");
    }

    String::from_utf8(buffer).unwrap_or_else(|e| {
        tracing::error!("Failed to convert metrics to string: {}", e);
        String::from("# Error converting metrics\n")
    })
}
