//! Onboarding progress endpoints

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;
use tower_cookies::Cookies;
use verification_core::{OnboardingStatus, Role, VerificationStatus};

use crate::error::{ApiError, FieldError};
use crate::review::{AccountSnapshot, Principal};
use crate::state::AppState;
use crate::store::{SessionStore, User, VerificationStore};

#[derive(Serialize)]
pub struct OnboardingResponse {
    pub success: bool,
    pub onboarding: Option<OnboardingStatus>,
    pub onboarding_completed: Option<bool>,
    pub verification_status: VerificationStatus,
}

fn signed_in_user<V, S>(
    state: &AppState<V, S>,
    cookies: &Cookies,
    headers: &HeaderMap,
) -> Result<User, ApiError>
where
    V: VerificationStore,
    S: SessionStore,
{
    match super::session::current_principal(state, cookies, headers)? {
        Principal::User(user) => Ok(user),
        Principal::Service { .. } => Err(ApiError::Forbidden("Onboarding requires a user session")),
    }
}

fn require_role(user: &User, role: Role) -> Result<(), ApiError> {
    if user.role == role {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Not available for this account type"))
    }
}

fn respond<V: VerificationStore>(store: &V, user: User) -> Result<Json<OnboardingResponse>, ApiError> {
    let snapshot = AccountSnapshot::load(store, user)?;
    Ok(Json(OnboardingResponse {
        success: true,
        onboarding_completed: snapshot.onboarding_completed_flag(),
        verification_status: snapshot.status(),
        onboarding: snapshot.onboarding,
    }))
}

/// GET /api/onboarding
pub async fn get_onboarding<V, S>(
    State(state): State<Arc<AppState<V, S>>>,
    cookies: Cookies,
    headers: HeaderMap,
) -> Result<Json<OnboardingResponse>, ApiError>
where
    V: VerificationStore,
    S: SessionStore,
{
    let user = signed_in_user(&state, &cookies, &headers)?;
    respond(&state.store, user)
}

/// PUT /api/onboarding/steps/:step
pub async fn complete_step<V, S>(
    State(state): State<Arc<AppState<V, S>>>,
    cookies: Cookies,
    headers: HeaderMap,
    Path(step): Path<u8>,
) -> Result<Json<OnboardingResponse>, ApiError>
where
    V: VerificationStore,
    S: SessionStore,
{
    let user = signed_in_user(&state, &cookies, &headers)?;
    require_role(&user, Role::Contractor)?;

    let mut status = state
        .store
        .get_onboarding(user.id)?
        .unwrap_or_else(|| OnboardingStatus::new(user.id.0));
    status
        .complete_step(step)
        .map_err(|e| ApiError::invalid("step", e.to_string()))?;
    state.store.upsert_onboarding(&status)?;

    tracing::debug!(user_id = %user.id, step, "Onboarding step completed");
    respond(&state.store, user)
}

/// POST /api/onboarding/submit
pub async fn submit<V, S>(
    State(state): State<Arc<AppState<V, S>>>,
    cookies: Cookies,
    headers: HeaderMap,
) -> Result<Json<OnboardingResponse>, ApiError>
where
    V: VerificationStore,
    S: SessionStore,
{
    let user = signed_in_user(&state, &cookies, &headers)?;
    require_role(&user, Role::Contractor)?;

    let mut status = state
        .store
        .get_onboarding(user.id)?
        .unwrap_or_else(|| OnboardingStatus::new(user.id.0));
    let missing = status.missing_steps();
    if !missing.is_empty() {
        return Err(ApiError::Validation(
            missing
                .into_iter()
                .map(|step| FieldError::new(format!("step{}", step), "is not complete"))
                .collect(),
        ));
    }

    status.is_submitted = true;
    status.updated_at = chrono::Utc::now();
    state.store.upsert_onboarding(&status)?;

    tracing::info!(user_id = %user.id, "Onboarding submitted for review");
    respond(&state.store, user)
}

/// POST /api/onboarding/complete
pub async fn complete_event_manager<V, S>(
    State(state): State<Arc<AppState<V, S>>>,
    cookies: Cookies,
    headers: HeaderMap,
) -> Result<Json<OnboardingResponse>, ApiError>
where
    V: VerificationStore,
    S: SessionStore,
{
    let user = signed_in_user(&state, &cookies, &headers)?;
    require_role(&user, Role::EventManager)?;

    state.store.set_onboarding_completed(user.id, true)?;

    tracing::info!(user_id = %user.id, "Event manager onboarding completed");
    respond(&state.store, user)
}
