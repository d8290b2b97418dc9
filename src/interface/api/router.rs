//! API Router configuration

use super::agent_handler::{release_agent, report_outcome};
use super::dialing_handler::{dashboard, get_stats, start_dialing, stop_dialing, AppState};
use super::metrics_handler::{metrics_handler, track_requests};
use super::websocket::{websocket_handler, EventBroadcaster};
use axum::{
    middleware,
    routing::{get, post},
    Json, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the API router
pub fn build_router(
    state: AppState,
    prometheus_handle: PrometheusHandle,
    event_broadcaster: Arc<EventBroadcaster>,
) -> Router {
    // Health check route
    let health_routes = Router::new().route("/health", get(health_check));

    // Predictive dialing routes
    let dialing_routes = Router::new()
        .route("/api/predictive/dashboard", get(dashboard))
        .route("/api/predictive/:campaign_id/start", post(start_dialing))
        .route("/api/predictive/:campaign_id/stop", post(stop_dialing))
        .route("/api/predictive/:campaign_id/stats", get(get_stats));

    // Agent and call callback routes
    let agent_routes = Router::new()
        .route("/api/agents/:agent_id/release", post(release_agent))
        .route("/api/calls/:call_id/outcome", post(report_outcome));

    // Metrics route (separate state)
    let metrics_routes = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(prometheus_handle);

    // WebSocket route (separate state)
    let ws_routes = Router::new()
        .route("/ws", get(websocket_handler))
        .with_state(event_broadcaster);

    Router::new()
        .merge(health_routes)
        .merge(dialing_routes)
        .merge(agent_routes)
        .with_state(state)
        .merge(metrics_routes)
        .merge(ws_routes)
        .route_layer(middleware::from_fn(track_requests))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
