//! HTTP API tests against the in-process router

mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use call_analytics::analytics::{AnalyticsReport, MetricKey, ResolvedPeriods};
use call_analytics::api::{build_router, handlers::HealthResponse, AppState};
use call_analytics::config::Config;
use call_analytics::metrics::{gather_metrics, init_metrics};
use chrono::{Duration, NaiveDate};
use common::{call_at, fixed_now, metric_exists, parse_prometheus_output, sample_events};
use serde_json::{json, Value};
use tower::ServiceExt;

fn app_with(config: Config) -> Router {
    build_router(AppState::from_config(config).unwrap())
}

fn app() -> Router {
    app_with(Config::default())
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

#[tokio::test]
async fn test_health_check() {
    let response = app().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let health: HealthResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(health.status, "healthy");
    assert_eq!(health.service, "call-analytics");
}

#[tokio::test]
async fn test_compute_relative_window() {
    let payload = json!({
        "events": sample_events(),
        "window": { "mode": "relative", "days": 7 },
        "now": fixed_now(),
    });

    let response = app().oneshot(post_json("/v1/analytics", &payload)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let report: AnalyticsReport = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(report.periods.span_days, 7);
    assert_eq!(report.periods.current.end, fixed_now());
    assert_eq!(report.time_series.counts.len(), 7);
    assert_eq!(report.metrics.len(), 5);
}

#[tokio::test]
async fn test_compute_custom_window() {
    let payload = json!({
        "events": [
            call_at("a", fixed_now() - Duration::days(2), 65),
            call_at("b", fixed_now() - Duration::days(2), 610),
        ],
        "window": { "mode": "custom", "start": "2024-03-10", "end": "2024-03-14" },
        "now": fixed_now(),
    });

    let response = app().oneshot(post_json("/v1/analytics", &payload)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let report: AnalyticsReport = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(report.periods.span_days, 5);
    let calls = report
        .metrics
        .iter()
        .find(|m| m.key == MetricKey::CallCount)
        .unwrap();
    assert_eq!(calls.current, 2.0);
    assert_eq!(calls.change, 0.0);
}

#[tokio::test]
async fn test_too_many_events_rejected() {
    let mut config = Config::default();
    config.server.max_events = 2;

    let payload = json!({ "events": sample_events(), "now": fixed_now() });
    let response = app_with(config)
        .oneshot(post_json("/v1/analytics", &payload))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_oversized_window_rejected() {
    let payload = json!({
        "events": [],
        "window": { "mode": "relative", "days": 100000 },
    });

    let response = app().oneshot(post_json("/v1/analytics", &payload)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_body_uses_error_envelope() {
    let request = Request::builder()
        .method("POST")
        .uri("/v1/analytics")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"events\": 42}"))
        .unwrap();

    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"]["status"], 400);
}

#[tokio::test]
async fn test_null_direction_does_not_reject_request() {
    let payload = json!({
        "events": [
            {
                "id": "a",
                "start_timestamp": fixed_now() - Duration::hours(1),
                "duration_secs": 65,
                "direction": null,
            },
            call_at("b", fixed_now() - Duration::hours(2), 30),
        ],
        "now": fixed_now(),
    });

    let response = app().oneshot(post_json("/v1/analytics", &payload)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let report: AnalyticsReport = serde_json::from_slice(&body_bytes(response).await).unwrap();
    let calls = report
        .metrics
        .iter()
        .find(|m| m.key == MetricKey::CallCount)
        .unwrap();
    assert_eq!(calls.current, 2.0);
}

#[tokio::test]
async fn test_window_at_last_calendar_day_is_computed() {
    let payload = json!({
        "events": [],
        "window": { "mode": "custom", "start": NaiveDate::MAX, "end": NaiveDate::MAX },
        "now": fixed_now(),
    });

    let response = app().oneshot(post_json("/v1/analytics", &payload)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let report: AnalyticsReport = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(report.periods.span_days, 1);
}

#[tokio::test]
async fn test_resolve_periods() {
    let response = app()
        .oneshot(get("/v1/analytics/periods?window=30d&now=2024-03-15T12:00:00Z"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let periods: ResolvedPeriods = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(periods.span_days, 30);
    assert_eq!(periods.current.end, fixed_now());
    assert_eq!(periods.previous.end, periods.current.start);
}

#[tokio::test]
async fn test_resolve_periods_bad_window() {
    let response = app()
        .oneshot(get("/v1/analytics/periods?window=fortnight"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_resolve_periods_rejects_oversized_window() {
    let response = app()
        .oneshot(get("/v1/analytics/periods?window=4000000000d"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_resolve_periods_bad_now_uses_error_envelope() {
    let response = app()
        .oneshot(get("/v1/analytics/periods?window=7d&now=yesterday"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_metrics_endpoint_exposes_analytics_counters() {
    init_metrics().unwrap();
    let app = app();

    let payload = json!({ "events": sample_events(), "now": fixed_now() });
    let response = app
        .clone()
        .oneshot(post_json("/v1/analytics", &payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let text = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(metric_exists(&text, "call_analytics_analytics_computations_total"));
    assert!(metric_exists(&text, "call_analytics_http_requests_total"));

    let parsed = parse_prometheus_output(&gather_metrics());
    assert!(parsed.contains_key("call_analytics_analytics_events_total"));
}
