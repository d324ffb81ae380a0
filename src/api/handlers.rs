use crate::analytics::{AnalyticsReport, ReportWindow, ResolvedPeriods};
use crate::api::AppState;
use crate::error::{AppError, Result};
use crate::metrics::gather_metrics;
use crate::models::CallEvent;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::header,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Longest window the service will compute, in days
pub const MAX_WINDOW_DAYS: i64 = 3660;

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>> {
    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        service: state.config.observability.service_name.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
    }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub uptime_seconds: u64,
}

/// Compute a full analytics report over the supplied events
pub async fn compute_analytics(
    State(state): State<AppState>,
    payload: std::result::Result<Json<AnalyticsRequest>, JsonRejection>,
) -> Result<Json<AnalyticsReport>> {
    let Json(request) = payload?;
    request.validate()?;

    let max_events = state.config.server.max_events;
    if request.events.len() as u64 > max_events {
        return Err(AppError::Validation(format!(
            "{} events exceeds the limit of {}",
            request.events.len(),
            max_events
        )));
    }

    let request_id = Uuid::new_v4();
    let AnalyticsRequest { events, window, now } = request;
    let now = now.unwrap_or_else(Utc::now);
    let engine = state.engine.clone();

    let span = tracing::info_span!("compute_analytics", %request_id, events = events.len());
    let timeout = Duration::from_secs(state.config.server.request_timeout_secs);

    // CPU-bound; keep it off the async workers
    let task = tokio::task::spawn_blocking(move || {
        let _guard = span.enter();
        engine.compute(&events, &window, now)
    });

    let report = tokio::time::timeout(timeout, task)
        .await
        .map_err(|_| {
            AppError::Timeout(format!(
                "analytics request {} exceeded {}s",
                request_id,
                timeout.as_secs()
            ))
        })?
        .map_err(|e| AppError::Internal(format!("analytics task failed: {}", e)))?;

    Ok(Json(report))
}

#[derive(Debug, Deserialize, Validate)]
pub struct AnalyticsRequest {
    pub events: Vec<CallEvent>,
    #[serde(default)]
    #[validate(custom(function = "validate_window"))]
    pub window: ReportWindow,
    /// Reference instant; the server clock when absent
    #[serde(default)]
    pub now: Option<DateTime<Utc>>,
}

fn validate_window(window: &ReportWindow) -> std::result::Result<(), ValidationError> {
    let days = match window {
        ReportWindow::Relative { days } => i64::from(*days),
        ReportWindow::Custom {
            start: Some(start),
            end: Some(end),
        } => (*end - *start).num_days().abs() + 1,
        ReportWindow::Custom { .. } => return Ok(()),
    };

    if days > MAX_WINDOW_DAYS {
        let mut err = ValidationError::new("window_too_long");
        err.message = Some(format!("window spans {} days, limit is {}", days, MAX_WINDOW_DAYS).into());
        return Err(err);
    }

    Ok(())
}

/// Resolve a window string without computing a report
pub async fn resolve_periods(
    State(state): State<AppState>,
    query: std::result::Result<Query<PeriodsQuery>, QueryRejection>,
) -> Result<Json<ResolvedPeriods>> {
    let Query(params) = query?;
    let window: ReportWindow = params.window.parse()?;
    validate_window(&window).map_err(|e| AppError::Validation(e.to_string()))?;
    let now = params.now.unwrap_or_else(Utc::now);

    let periods = state.engine.resolve(&window, now);
    tracing::debug!(%window, span_days = periods.span_days, "Resolved periods");

    Ok(Json(periods))
}

#[derive(Debug, Deserialize)]
pub struct PeriodsQuery {
    #[serde(default = "default_window")]
    pub window: String,
    pub now: Option<DateTime<Utc>>,
}

fn default_window() -> String {
    ReportWindow::default().to_string()
}

/// Prometheus scrape endpoint
pub async fn metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        gather_metrics(),
    )
}
