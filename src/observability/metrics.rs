// ============================================================================
// PROMETHEUS METRICS - Sistema de Observabilidad
// ============================================================================
// Métricas registradas una vez en el registry global y expuestas en /metrics
// ============================================================================

use lazy_static::lazy_static;
use prometheus::{register_histogram_vec, register_int_counter_vec, HistogramVec, IntCounterVec};

lazy_static! {
    // ========================================================================
    // HTTP REQUEST METRICS
    // ========================================================================

    /// Total de requests HTTP por método, endpoint y status
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests",
        &["method", "endpoint", "status"]
    )
    .unwrap();

    /// Duración de requests HTTP en segundos
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["method", "endpoint"],
        vec![0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 2.5, 5.0]
    )
    .unwrap();

    // ========================================================================
    // INVITATION METRICS
    // ========================================================================

    /// Checks by outcome: redeemed, already_redeemed, invalid, storage_error
    pub static ref INVITATION_CHECKS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "invitation_checks_total",
        "Total invitation checks by outcome",
        &["outcome"]
    )
    .unwrap();

    pub static ref REDEMPTION_PROCESSING_DURATION: HistogramVec = register_histogram_vec!(
        "redemption_processing_duration_seconds",
        "Redemption processing duration in seconds",
        &["operation"],
        vec![0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0]
    )
    .unwrap();

    /// QR files produced by the generator
    pub static ref QR_CODES_GENERATED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "qr_codes_generated_total",
        "Total invitation QR codes generated",
        &["status"]
    )
    .unwrap();
}

pub fn record_http_request(method: &str, endpoint: &str, status: u16, duration_secs: f64) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, endpoint, &status.to_string()])
        .inc();

    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, endpoint])
        .observe(duration_secs);
}

pub fn record_invitation_check(outcome: &str) {
    INVITATION_CHECKS_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn record_qr_generated(status: &str) {
    QR_CODES_GENERATED_TOTAL.with_label_values(&[status]).inc();
}
