// ============================================================================
// CHECK ENDPOINT TESTS - HTTP behaviour of GET /check against SQLite stores
// ============================================================================

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use invite_check::{
    api::check::{ALREADY_USED_HTML, ERROR_HTML, INVALID_CODE_HTML, REDEEMED_HTML},
    create_app_router,
    state::AppState,
};
use shared::{config::DatabaseConfig, connect_scan_store, ScanStore, SqliteScanStore};
use std::sync::Arc;
use tower::ServiceExt;

// ========================================================================
// HELPER FUNCTIONS
// ========================================================================

fn memory_config() -> DatabaseConfig {
    DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        ..DatabaseConfig::default()
    }
}

fn file_config(dir: &tempfile::TempDir) -> DatabaseConfig {
    DatabaseConfig {
        url: format!("sqlite://{}", dir.path().join("invitations.db").display()),
        max_connections: 8,
        ..DatabaseConfig::default()
    }
}

fn app_with_store(store: Arc<dyn ScanStore>, capacity: u32) -> Router {
    create_app_router(Arc::new(AppState::from_store(store, capacity)))
}

async fn memory_app() -> (Router, Arc<dyn ScanStore>) {
    let store = connect_scan_store(&memory_config()).await.unwrap();
    (app_with_store(store.clone(), 300), store)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, String) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

// ========================================================================
// REDEMPTION FLOW
// ========================================================================

#[tokio::test]
async fn test_end_to_end_first_scan_then_already_used() {
    let (app, _store) = memory_app().await;

    assert_eq!(get(&app, "/check?id=1").await, (StatusCode::OK, REDEEMED_HTML.to_string()));
    assert_eq!(get(&app, "/check?id=1").await, (StatusCode::OK, ALREADY_USED_HTML.to_string()));
    assert_eq!(
        get(&app, "/check?id=301").await,
        (StatusCode::BAD_REQUEST, INVALID_CODE_HTML.to_string())
    );
}

#[tokio::test]
async fn test_every_id_in_pool_redeems_exactly_once() {
    let (app, store) = memory_app().await;

    for id in 1..=300 {
        let (status, body) = get(&app, &format!("/check?id={}", id)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, REDEEMED_HTML, "first scan of {} should succeed", id);
    }

    for id in [1, 150, 300] {
        let (status, body) = get(&app, &format!("/check?id={}", id)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, ALREADY_USED_HTML);
        assert!(store.find(id).await.unwrap().is_some());
    }
}

#[tokio::test]
async fn test_repeated_checks_are_identical() {
    let (app, _store) = memory_app().await;

    get(&app, "/check?id=77").await;
    let responses: Vec<_> = get_repeatedly(&app, "/check?id=77", 5).await;

    assert!(responses
        .iter()
        .all(|r| *r == (StatusCode::OK, ALREADY_USED_HTML.to_string())));
}

async fn get_repeatedly(app: &Router, uri: &str, times: usize) -> Vec<(StatusCode, String)> {
    let mut out = Vec::with_capacity(times);
    for _ in 0..times {
        out.push(get(app, uri).await);
    }
    out
}

#[tokio::test]
async fn test_invalid_ids_are_rejected_without_state_change() {
    let (app, store) = memory_app().await;

    for uri in [
        "/check",
        "/check?id=",
        "/check?id=0",
        "/check?id=301",
        "/check?id=abc",
        "/check?id=-5",
    ] {
        let (status, body) = get(&app, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{} should be rejected", uri);
        assert_eq!(body, INVALID_CODE_HTML);
    }

    assert!(store.find(0).await.unwrap().is_none());
    assert!(store.find(301).await.unwrap().is_none());
}

#[tokio::test]
async fn test_repeated_id_parameter_gets_invalid_code_page() {
    let (app, store) = memory_app().await;

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/check?id=1&id=2").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/html; charset=utf-8");
    assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(bytes, INVALID_CODE_HTML.as_bytes());

    assert!(store.find(1).await.unwrap().is_none());
    assert!(store.find(2).await.unwrap().is_none());
}

#[tokio::test]
async fn test_check_response_headers() {
    let (app, _store) = memory_app().await;

    let response = app
        .oneshot(Request::builder().uri("/check?id=2").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let headers = response.headers();
    assert_eq!(headers[header::CONTENT_TYPE], "text/html; charset=utf-8");
    assert_eq!(headers[header::CACHE_CONTROL], "no-store");
    assert_eq!(headers["x-content-type-options"], "nosniff");
}

// ========================================================================
// CONCURRENCY
// ========================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_scans_have_single_winner() {
    let dir = tempfile::tempdir().unwrap();
    let store = connect_scan_store(&file_config(&dir)).await.unwrap();
    let app = app_with_store(store, 300);

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let app = app.clone();
            tokio::spawn(async move { get(&app, "/check?id=42").await })
        })
        .collect();

    let mut redeemed = 0;
    let mut already_used = 0;
    for handle in handles {
        let (status, body) = handle.await.unwrap();
        assert_eq!(status, StatusCode::OK, "no caller may see a server error");
        match body.as_str() {
            REDEEMED_HTML => redeemed += 1,
            ALREADY_USED_HTML => already_used += 1,
            other => panic!("unexpected body {}", other),
        }
    }

    assert_eq!(redeemed, 1);
    assert_eq!(already_used, 15);
}

// ========================================================================
// STORAGE FAILURE
// ========================================================================

#[tokio::test]
async fn test_storage_unavailable_returns_server_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = file_config(&dir);

    let store = SqliteScanStore::connect(&config).await.unwrap();
    store.ensure_schema().await.unwrap();
    store.pool().close().await;

    let app = app_with_store(Arc::new(store), 300);
    assert_eq!(
        get(&app, "/check?id=5").await,
        (StatusCode::INTERNAL_SERVER_ERROR, ERROR_HTML.to_string())
    );

    // Nothing was written before the failure.
    let reopened = connect_scan_store(&config).await.unwrap();
    assert!(reopened.find(5).await.unwrap().is_none());
}

// ========================================================================
// OPERATIONAL ENDPOINTS
// ========================================================================

#[tokio::test]
async fn test_health_reports_store_state() {
    let (app, _store) = memory_app().await;

    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);

    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["storage"], "sqlite");
}

#[tokio::test]
async fn test_health_fails_when_store_is_closed() {
    let store = SqliteScanStore::connect(&memory_config()).await.unwrap();
    store.pool().close().await;
    let app = app_with_store(Arc::new(store), 300);

    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["error"], "SERVICE_UNAVAILABLE");
}

#[tokio::test]
async fn test_metrics_expose_check_outcomes() {
    let (app, _store) = memory_app().await;
    get(&app, "/check?id=3").await;

    let (status, body) = get(&app, "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("invitation_checks_total"));
    assert!(body.contains("http_requests_total"));
}
