//! HTTP routes for the verification service

mod auth;
mod health;
mod onboarding;
mod session;
mod verification;

pub use session::{ADMIN_ID_HEADER, SESSION_COOKIE};

use std::sync::Arc;

use axum::routing::{get, post, put};
use axum::Router;
use tower_cookies::CookieManagerLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::store::{SessionStore, VerificationStore};

/// Create the router with all routes
pub fn create_router<V, S>(state: Arc<AppState<V, S>>) -> Router
where
    V: VerificationStore + 'static,
    S: SessionStore + 'static,
{
    Router::new()
        .route("/health", get(health::health))
        .route("/api/auth/signup", post(auth::signup))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/session", get(session::get_session_context))
        .route("/api/onboarding", get(onboarding::get_onboarding))
        .route("/api/onboarding/steps/:step", put(onboarding::complete_step))
        .route("/api/onboarding/submit", post(onboarding::submit))
        .route("/api/onboarding/complete", post(onboarding::complete_event_manager))
        .route("/api/verification/queue", get(verification::get_queue))
        .route("/api/verification/me", get(verification::get_own_verification))
        .route("/api/verification/:user_id", get(verification::get_verification))
        .route("/api/verification/:user_id/approve", post(verification::approve))
        .route("/api/verification/:user_id/reject", post(verification::reject))
        .route("/api/verification/:user_id/unapprove", post(verification::unapprove))
        .route("/api/verification/:user_id/resubmit", post(verification::resubmit))
        .layer(CookieManagerLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
