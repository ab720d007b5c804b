// ============================================================================
// CHECK ENDPOINT - Canje de invitación en el primer escaneo
// ============================================================================

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::{
    domains::invitations::{CheckOutcome, RedemptionError},
    observability::metrics::record_invitation_check,
    state::AppState,
};

pub const REDEEMED_HTML: &str = r#"<h1 style="text-align: center; font-size: 100px;">✓</h1>"#;
pub const ALREADY_USED_HTML: &str = r#"<h1 style="text-align: center; font-size: 100px;">✗</h1>"#;
pub const INVALID_CODE_HTML: &str = "<h1>Invalid QR Code</h1>";
pub const ERROR_HTML: &str = "<h1>Error</h1>";

#[derive(Debug, Deserialize)]
pub struct CheckQuery {
    pub id: Option<String>,
}

/// Check (and redeem) an invitation
///
/// # Endpoint
/// GET /check?id=<n>
///
/// # Returns
/// - 200 OK: ✓ on the first scan, ✗ on every later scan
/// - 400 Bad Request: id missing, repeated, not a number, or outside 1..=capacity
/// - 500 Internal Server Error: storage failure
pub async fn check_invitation(
    State(state): State<Arc<AppState>>,
    query: Result<Query<CheckQuery>, QueryRejection>,
) -> Response {
    // A query string that does not deserialize (e.g. `id` given twice) is
    // answered with the same page as any other bad code.
    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => {
            warn!("Rejected invitation check with unreadable query: {}", rejection);
            record_invitation_check("invalid");
            return html_response(StatusCode::BAD_REQUEST, INVALID_CODE_HTML);
        }
    };

    let result = state
        .redemption_service
        .check(query.id.as_deref())
        .await;

    match result {
        Ok(CheckOutcome::Redeemed { id, .. }) => {
            info!("Invitation {} checked: first scan", id);
            html_response(StatusCode::OK, REDEEMED_HTML)
        }
        Ok(CheckOutcome::AlreadyRedeemed { id }) => {
            info!("Invitation {} checked: already used", id);
            html_response(StatusCode::OK, ALREADY_USED_HTML)
        }
        Err(RedemptionError::InvalidCode(raw)) => {
            warn!("Rejected invitation check with id {:?}", raw);
            html_response(StatusCode::BAD_REQUEST, INVALID_CODE_HTML)
        }
        Err(RedemptionError::Storage(e)) => {
            error!("Storage error while checking invitation: {}", e);
            html_response(StatusCode::INTERNAL_SERVER_ERROR, ERROR_HTML)
        }
    }
}

fn html_response(status: StatusCode, body: &'static str) -> Response {
    (status, [(header::CACHE_CONTROL, "no-store")], Html(body)).into_response()
}
