//! Common test utilities for service integration tests

use std::sync::Arc;

use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderName, HeaderValue};
use axum_test::{TestRequest, TestServer};
use cookie::Cookie;
use verification_core::Role;
use verification_server::routes::{self, ADMIN_ID_HEADER, SESSION_COOKIE};
use verification_server::store::{NewUser, User};
use verification_server::{
    AppState, InMemorySessionStore, InMemoryVerificationStore, SessionStore, VerificationStore,
};

pub const ADMIN_TOKEN: &str = "test-admin-token";
pub const PASSWORD: &str = "password123";

/// Test server plus handles on the stores behind it
pub struct TestContext {
    pub server: TestServer,
    pub store: Arc<InMemoryVerificationStore>,
    pub sessions: Arc<InMemorySessionStore>,
}

/// Create a test server backed by in-memory stores, with the service token enabled
pub fn create_test_server() -> TestContext {
    let store = Arc::new(InMemoryVerificationStore::new());
    let sessions = Arc::new(InMemorySessionStore::new());

    let state = Arc::new(AppState::new(
        store.clone(),
        sessions.clone(),
        Some(ADMIN_TOKEN.to_string()),
    ));

    let app = routes::create_router(state);
    let server = TestServer::new(app).expect("Failed to create test server");

    TestContext {
        server,
        store,
        sessions,
    }
}

impl TestContext {
    /// Insert an account directly, with a cheap password hash
    pub fn create_account(&self, email: &str, role: Role) -> User {
        let password_hash = bcrypt::hash(PASSWORD, 4).expect("hash password");
        self.store
            .create_user(NewUser {
                email: email.to_string(),
                password_hash,
                role,
                full_name: None,
                company_name: (role == Role::Contractor).then(|| "Acme Staging".to_string()),
            })
            .expect("create account")
    }

    /// Session cookie for an account
    pub fn cookie_for(&self, user: &User) -> Cookie<'static> {
        let session = self.sessions.create(user.id).expect("create session");
        Cookie::new(SESSION_COOKIE, session.id.0)
    }

    /// Mark every contractor onboarding step done and submit
    pub async fn finish_contractor_onboarding(&self, user: &User) {
        let cookie = self.cookie_for(user);
        for step in 1..=4 {
            let response = self
                .server
                .put(&format!("/api/onboarding/steps/{}", step))
                .add_cookie(cookie.clone())
                .await;
            assert_eq!(response.status_code(), 200);
        }
        let response = self
            .server
            .post("/api/onboarding/submit")
            .add_cookie(cookie)
            .await;
        assert_eq!(response.status_code(), 200);
    }
}

/// Attach the service admin token
pub fn with_service_token(request: TestRequest) -> TestRequest {
    request.add_header(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", ADMIN_TOKEN)).unwrap(),
    )
}

/// Attach the service admin token acting as the given admin id
pub fn with_service_token_as(request: TestRequest, admin_id: &str) -> TestRequest {
    with_service_token(request).add_header(
        HeaderName::from_static(ADMIN_ID_HEADER),
        HeaderValue::from_str(admin_id).unwrap(),
    )
}
