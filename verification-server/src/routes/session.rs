//! Session cookies and request principals

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::Json;
use serde::Serialize;
use tower_cookies::{Cookie, Cookies};
use verification_core::Role;

use crate::error::ApiError;
use crate::review::Principal;
use crate::state::AppState;
use crate::store::{Session, SessionId, SessionStore, UserId, VerificationStore};

pub const SESSION_COOKIE: &str = "vetting_session";

/// Header naming the admin a service-token request acts for
pub const ADMIN_ID_HEADER: &str = "x-admin-id";

#[derive(Serialize)]
pub struct SessionContext {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    pub server_time: i64,
}

/// GET /api/auth/session
pub async fn get_session_context<V, S>(
    State(state): State<Arc<AppState<V, S>>>,
    cookies: Cookies,
) -> Result<Json<SessionContext>, ApiError>
where
    V: VerificationStore,
    S: SessionStore,
{
    let user = match get_session_from_cookies(&cookies, &state.session_store) {
        Some(session) => state.store.get_user(session.user_id)?,
        None => None,
    };

    Ok(Json(SessionContext {
        authenticated: user.is_some(),
        user_id: user.as_ref().map(|u| u.id),
        role: user.as_ref().map(|u| u.role),
        server_time: chrono::Utc::now().timestamp(),
    }))
}

/// Resolve the caller from a bearer token or the session cookie.
///
/// A bearer header that does not match the configured token is rejected
/// outright rather than falling back to the cookie.
pub fn current_principal<V, S>(
    state: &AppState<V, S>,
    cookies: &Cookies,
    headers: &HeaderMap,
) -> Result<Principal, ApiError>
where
    V: VerificationStore,
    S: SessionStore,
{
    if let Some(token) = bearer_token(headers) {
        return match &state.admin_token {
            Some(expected) if expected == token => Ok(Principal::Service {
                acting_as: headers
                    .get(ADMIN_ID_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string),
            }),
            _ => {
                tracing::warn!("Rejected bearer token");
                Err(ApiError::NotAuthenticated)
            }
        };
    }

    let session = get_session_from_cookies(cookies, &state.session_store)
        .ok_or(ApiError::NotAuthenticated)?;
    let user = state
        .store
        .get_user(session.user_id)?
        .ok_or(ApiError::NotAuthenticated)?;
    Ok(Principal::User(user))
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
}

/// Helper to get current session from cookies
pub fn get_session_from_cookies<S: SessionStore>(
    cookies: &Cookies,
    session_store: &S,
) -> Option<Session> {
    cookies.get(SESSION_COOKIE).and_then(|c| {
        let session_id = SessionId(c.value().to_string());
        session_store.get(&session_id).ok().flatten()
    })
}

/// Helper to set session cookie
pub fn set_session_cookie(cookies: &Cookies, session_id: &str) {
    let cookie = Cookie::build((SESSION_COOKIE, session_id.to_string()))
        .path("/")
        .http_only(true)
        .build();
    cookies.add(cookie);
}

/// Helper to clear session cookie
pub fn clear_session_cookie(cookies: &Cookies) {
    let cookie = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .max_age(tower_cookies::cookie::time::Duration::ZERO)
        .build();
    cookies.add(cookie);
}
