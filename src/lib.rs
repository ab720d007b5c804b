use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod domains;
pub mod observability;
pub mod security;
pub mod state;

use api::create_api_router;
use observability::{metrics_middleware, observability_router};
use security::security_headers_middleware;
use state::AppState;

use axum::middleware as axum_middleware;

pub fn create_app_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        // Health and Prometheus endpoints
        .merge(observability_router())
        // GET /check
        .merge(create_api_router())
        .with_state(app_state)
        .layer(axum_middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(axum_middleware::from_fn(security_headers_middleware))
}
