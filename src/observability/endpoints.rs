// ============================================================================
// ENDPOINTS DE HEALTH Y PROMETHEUS
// ============================================================================

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use shared::AppError;
use std::sync::Arc;
use tracing::error;

use crate::state::AppState;

pub fn observability_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
}

/// Healthy only when the scan store answers
async fn health_check(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    let store = state.redemption_service.store();

    store.ping().await.map_err(|e| {
        error!("Health check failed, {} store unreachable: {}", store.backend(), e);
        AppError::service_unavailable(format!("{} store", store.backend()))
    })?;

    let health = serde_json::json!({
        "status": "healthy",
        "service": "invite_check",
        "storage": store.backend(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    Ok((StatusCode::OK, Json(health)))
}

/// Prometheus text exposition
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = vec![];

    match encoder.encode(&metric_families, &mut buffer) {
        Ok(_) => {
            let response = String::from_utf8(buffer).unwrap_or_default();
            (StatusCode::OK, response).into_response()
        }
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to encode metrics").into_response()
        }
    }
}
