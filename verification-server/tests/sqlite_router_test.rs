//! End-to-end flow against the SQLite store

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;
use verification_server::config::BootstrapAdmin;
use verification_server::routes::{self, SESSION_COOKIE};
use verification_server::{bootstrap, AppState, SqliteStore, VerificationStore};

fn open_store(dir: &TempDir) -> Arc<SqliteStore> {
    let path = dir.path().join("verification.db");
    Arc::new(SqliteStore::open(path.to_str().unwrap()).unwrap())
}

fn server_for(store: Arc<SqliteStore>) -> TestServer {
    let state = Arc::new(AppState::new(store.clone(), store, None));
    TestServer::new(routes::create_router(state)).unwrap()
}

/// Test: signup, onboarding, review and reopening the database
#[tokio::test]
async fn test_review_flow_persists() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let admin = BootstrapAdmin {
        email: "ops@example.com".to_string(),
        password: "ops-password".to_string(),
    };
    bootstrap::ensure_admin(&store, &admin).unwrap();
    let server = server_for(store.clone());

    let response = server
        .post("/api/auth/signup")
        .json(&json!({
            "email": "vendor@example.com",
            "password": "longenough",
            "role": "contractor",
            "company_name": "Acme Staging"
        }))
        .await;
    assert_eq!(response.status_code(), 200);
    let contractor_cookie = response.cookie(SESSION_COOKIE);
    let contractor_id = response.json::<Value>()["user_id"]
        .as_str()
        .unwrap()
        .to_string();

    for step in 1..=4 {
        server
            .put(&format!("/api/onboarding/steps/{}", step))
            .add_cookie(contractor_cookie.clone())
            .await
            .assert_status_ok();
    }
    let response = server
        .post("/api/onboarding/submit")
        .add_cookie(contractor_cookie.clone())
        .await;
    assert_eq!(response.json::<Value>()["verification_status"], "pending");

    let response = server
        .post("/api/auth/login")
        .json(&json!({ "email": "ops@example.com", "password": "ops-password" }))
        .await;
    assert_eq!(response.status_code(), 200);
    let admin_cookie = response.cookie(SESSION_COOKIE);

    let response = server
        .post(&format!("/api/verification/{}/reject", contractor_id))
        .add_cookie(admin_cookie.clone())
        .json(&json!({ "reason": "logo mismatch" }))
        .await;
    assert_eq!(response.json::<Value>()["verification_status"], "rejected");

    let response = server
        .post(&format!("/api/verification/{}/approve", contractor_id))
        .add_cookie(admin_cookie)
        .await;
    assert_eq!(response.json::<Value>()["verification_status"], "approved");

    drop(server);
    drop(store);

    // Everything survives a reopen
    let store = open_store(&dir);
    let user = store
        .get_user_by_email("vendor@example.com")
        .unwrap()
        .unwrap();
    assert!(user.is_verified);
    assert!(store.get_business_profile(user.id).unwrap().unwrap().is_verified);
    let logs = store.list_verification_logs(user.id).unwrap();
    assert_eq!(logs.len(), 2);
    assert!(logs[0].created_at > logs[1].created_at);
    assert!(store.get_onboarding(user.id).unwrap().unwrap().is_submitted);
}

/// Test: without a configured token, bearer requests are refused
#[tokio::test]
async fn test_no_service_token_configured() {
    let dir = TempDir::new().unwrap();
    let server = server_for(open_store(&dir));

    let response = server
        .get("/api/verification/queue")
        .add_header(
            axum::http::header::AUTHORIZATION,
            axum::http::HeaderValue::from_static("Bearer anything"),
        )
        .await;
    assert_eq!(response.status_code(), 401);
}

/// Test: health check through the bare router
#[tokio::test]
async fn test_health() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let app = routes::create_router(Arc::new(AppState::new(store.clone(), store, None)));

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
