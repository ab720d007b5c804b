pub mod check;

use axum::{routing::get, Router};
use std::sync::Arc;

use crate::state::AppState;

/// Public API routes. The check endpoint is scanned from phones, so there is
/// no authentication layer here.
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new().route("/check", get(check::check_invitation))
}
