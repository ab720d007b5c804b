// ============================================================================
// MIDDLEWARE PARA MÉTRICAS AUTOMÁTICAS
// ============================================================================

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

use crate::observability::record_http_request;

/// Middleware que registra conteo y latencia de todas las requests HTTP
pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let normalized_path = normalize_path(req.uri().path());

    let response = next.run(req).await;

    record_http_request(
        &method,
        &normalized_path,
        response.status().as_u16(),
        start.elapsed().as_secs_f64(),
    );

    response
}

/// Normaliza segmentos numéricos del path para limitar la cardinalidad de labels
fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(|seg| {
            if !seg.is_empty() && seg.parse::<i64>().is_ok() {
                ":id"
            } else {
                seg
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}
