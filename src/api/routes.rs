use crate::api::{handlers, AppState};
use crate::metrics::track_metrics;
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

/// Build the main API router
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.server.max_body_bytes;
    let track = state.config.observability.prometheus_enabled;

    let router = Router::new()
        // Health endpoints
        .route("/health", get(handlers::health_check))
        .route("/health/live", get(handlers::health_check))
        // Analytics
        .route("/v1/analytics", post(handlers::compute_analytics))
        .route("/v1/analytics/periods", get(handlers::resolve_periods))
        // Prometheus scrape endpoint
        .route("/metrics", get(handlers::metrics))
        // Add state
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit));

    let router = if track {
        router.layer(middleware::from_fn(track_metrics))
    } else {
        router
    };

    router
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_response(DefaultOnResponse::new().include_headers(true)),
        )
        .layer(CorsLayer::permissive())
}
