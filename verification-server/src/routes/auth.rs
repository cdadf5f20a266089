//! Account creation and authentication endpoints

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tower_cookies::Cookies;
use verification_core::Role;

use crate::crypto::{hash_password, verify_password};
use crate::error::{ApiError, FieldError};
use crate::state::AppState;
use crate::store::{NewUser, SessionStore, UserId, VerificationStore};

/// Minimum password length
const MIN_PASSWORD_LENGTH: usize = 8;
/// bcrypt ignores input past 72 bytes
const MAX_PASSWORD_LENGTH: usize = 72;

#[derive(Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub role: String,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub user_id: UserId,
    pub role: Role,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn validate_signup(req: &SignupRequest) -> Result<Role, ApiError> {
    let mut errors = Vec::new();

    let email = req.email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => {}
        _ => errors.push(FieldError::new("email", "must be a valid email address")),
    }

    if req.password.chars().count() < MIN_PASSWORD_LENGTH {
        errors.push(FieldError::new(
            "password",
            format!("must be at least {} characters", MIN_PASSWORD_LENGTH),
        ));
    } else if req.password.len() > MAX_PASSWORD_LENGTH {
        errors.push(FieldError::new(
            "password",
            format!("must be at most {} bytes", MAX_PASSWORD_LENGTH),
        ));
    }

    let role = match req.role.parse::<Role>() {
        Ok(Role::Admin) => {
            errors.push(FieldError::new("role", "admin accounts cannot sign up"));
            None
        }
        Ok(role) => Some(role),
        Err(e) => {
            errors.push(FieldError::new("role", e.to_string()));
            None
        }
    };

    if role == Some(Role::Contractor) && non_blank(req.company_name.clone()).is_none() {
        errors.push(FieldError::new(
            "company_name",
            "is required for contractors",
        ));
    }

    match role {
        Some(role) if errors.is_empty() => Ok(role),
        _ => Err(ApiError::Validation(errors)),
    }
}

/// POST /api/auth/signup
pub async fn signup<V, S>(
    State(state): State<Arc<AppState<V, S>>>,
    cookies: Cookies,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError>
where
    V: VerificationStore,
    S: SessionStore,
{
    let Json(req) = payload?;
    let role = validate_signup(&req)?;

    if state.store.get_user_by_email(req.email.trim())?.is_some() {
        return Err(ApiError::EmailAlreadyExists);
    }

    let password_hash =
        hash_password(&req.password).map_err(|e| ApiError::Internal(e.to_string()))?;

    let user = state.store.create_user(NewUser {
        email: req.email.trim().to_string(),
        password_hash,
        role,
        full_name: non_blank(req.full_name),
        company_name: non_blank(req.company_name),
    })?;
    tracing::info!(user_id = %user.id, role = %user.role, "Account created");

    let session = state.session_store.create(user.id)?;
    super::session::set_session_cookie(&cookies, &session.id.0);

    Ok(Json(AuthResponse {
        success: true,
        user_id: user.id,
        role: user.role,
    }))
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /api/auth/login
pub async fn login<V, S>(
    State(state): State<Arc<AppState<V, S>>>,
    cookies: Cookies,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError>
where
    V: VerificationStore,
    S: SessionStore,
{
    let Json(req) = payload?;
    let user = state
        .store
        .get_user_by_email(req.email.trim())?
        .ok_or(ApiError::InvalidCredentials)?;

    let valid = verify_password(&req.password, &user.password_hash)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    if !valid {
        return Err(ApiError::InvalidCredentials);
    }

    let session = state.session_store.create(user.id)?;
    super::session::set_session_cookie(&cookies, &session.id.0);

    Ok(Json(AuthResponse {
        success: true,
        user_id: user.id,
        role: user.role,
    }))
}

#[derive(Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

/// POST /api/auth/logout
pub async fn logout<V, S>(
    State(state): State<Arc<AppState<V, S>>>,
    cookies: Cookies,
) -> Json<LogoutResponse>
where
    V: VerificationStore,
    S: SessionStore,
{
    if let Some(session) =
        super::session::get_session_from_cookies(&cookies, &state.session_store)
    {
        if let Err(e) = state.session_store.delete(&session.id) {
            tracing::warn!(error = %e, "Failed to delete session");
        }
    }

    super::session::clear_session_cookie(&cookies);

    Json(LogoutResponse { success: true })
}
