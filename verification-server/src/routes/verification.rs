//! Verification review endpoints

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_cookies::Cookies;
use uuid::Uuid;
use verification_core::{
    OnboardingStatus, Role, VerificationAction, VerificationLogEntry, VerificationStatus,
};

use crate::error::ApiError;
use crate::queue::{fetch_queue, QueueFilter, QueuePage, QueueQuery};
use crate::review::{self, AccountSnapshot, ActionDetails, ActionOutcome, Principal};
use crate::state::AppState;
use crate::store::{BusinessProfile, SessionStore, UserId, VerificationStore};

/// Unparseable ids cannot name a user
fn parse_user_id(raw: &str) -> Result<UserId, ApiError> {
    Uuid::parse_str(raw)
        .map(UserId)
        .map_err(|_| ApiError::UserNotFound)
}

#[derive(Serialize)]
pub struct UserView {
    pub id: UserId,
    pub email: String,
    pub role: Role,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct VerificationDetail {
    pub success: bool,
    pub user: UserView,
    pub business_profile: Option<BusinessProfile>,
    pub onboarding: Option<OnboardingStatus>,
    pub onboarding_completed: Option<bool>,
    /// Newest first
    pub logs: Vec<VerificationLogEntry>,
    pub resubmitted: bool,
    pub verification_status: VerificationStatus,
}

impl From<AccountSnapshot> for VerificationDetail {
    fn from(snapshot: AccountSnapshot) -> Self {
        let verification_status = snapshot.status();
        let resubmitted = snapshot.summary().resubmitted_since_rejection();
        let onboarding_completed = snapshot.onboarding_completed_flag();
        Self {
            success: true,
            user: UserView {
                id: snapshot.user.id,
                email: snapshot.user.email,
                role: snapshot.user.role,
                is_verified: snapshot.user.is_verified,
                created_at: snapshot.user.created_at,
            },
            business_profile: snapshot.business_profile,
            onboarding: snapshot.onboarding,
            onboarding_completed,
            logs: snapshot.log,
            resubmitted,
            verification_status,
        }
    }
}

/// GET /api/verification/:user_id
pub async fn get_verification<V, S>(
    State(state): State<Arc<AppState<V, S>>>,
    cookies: Cookies,
    headers: HeaderMap,
    Path(user_id): Path<String>,
) -> Result<Json<VerificationDetail>, ApiError>
where
    V: VerificationStore,
    S: SessionStore,
{
    let principal = super::session::current_principal(&state, &cookies, &headers)?;
    let user_id = parse_user_id(&user_id)?;
    if !principal.can_view(user_id) {
        return Err(ApiError::Forbidden("Admin access required"));
    }

    let snapshot = AccountSnapshot::load_by_id(&state.store, user_id)?;
    Ok(Json(snapshot.into()))
}

/// GET /api/verification/me
pub async fn get_own_verification<V, S>(
    State(state): State<Arc<AppState<V, S>>>,
    cookies: Cookies,
    headers: HeaderMap,
) -> Result<Json<VerificationDetail>, ApiError>
where
    V: VerificationStore,
    S: SessionStore,
{
    match super::session::current_principal(&state, &cookies, &headers)? {
        Principal::User(user) => Ok(Json(AccountSnapshot::load(&state.store, user)?.into())),
        Principal::Service { .. } => Err(ApiError::Forbidden("Requires a user session")),
    }
}

#[derive(Serialize)]
pub struct QueueResponse {
    pub success: bool,
    #[serde(flatten)]
    pub page: QueuePage,
}

/// GET /api/verification/queue
pub async fn get_queue<V, S>(
    State(state): State<Arc<AppState<V, S>>>,
    cookies: Cookies,
    headers: HeaderMap,
    Query(query): Query<QueueQuery>,
) -> Result<Json<QueueResponse>, ApiError>
where
    V: VerificationStore,
    S: SessionStore,
{
    let principal = super::session::current_principal(&state, &cookies, &headers)?;
    if !principal.is_admin() {
        return Err(ApiError::Forbidden("Admin access required"));
    }

    let filter = QueueFilter::try_from(query)?;
    let page = fetch_queue(&state.store, &filter)?;
    Ok(Json(QueueResponse {
        success: true,
        page,
    }))
}

/// Body of the action endpoints; every field is optional on the wire
#[derive(Debug, Default, Deserialize)]
pub struct ActionRequest {
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub feedback: Option<String>,
    /// Resubmission notes; stored as the entry's reason
    #[serde(default)]
    pub notes: Option<String>,
}

impl ActionRequest {
    fn details(self) -> ActionDetails {
        fn clean(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }
        ActionDetails {
            reason: clean(self.reason.or(self.notes)),
            feedback: clean(self.feedback),
        }
    }
}

/// An empty body means no details; anything else must be a valid request
fn parse_action_body(body: &[u8]) -> Result<ActionRequest, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ActionRequest::default());
    }
    Ok(serde_json::from_slice(body)?)
}

#[derive(Serialize)]
pub struct ActionResponse {
    pub success: bool,
    pub entry: VerificationLogEntry,
    pub verification_status: VerificationStatus,
}

impl From<ActionOutcome> for ActionResponse {
    fn from(outcome: ActionOutcome) -> Self {
        Self {
            success: true,
            entry: outcome.entry,
            verification_status: outcome.status,
        }
    }
}

async fn admin_action<V, S>(
    state: &AppState<V, S>,
    cookies: &Cookies,
    headers: &HeaderMap,
    user_id: &str,
    action: VerificationAction,
    body: Bytes,
) -> Result<Json<ActionResponse>, ApiError>
where
    V: VerificationStore,
    S: SessionStore,
{
    let principal = super::session::current_principal(state, cookies, headers)?;
    if !principal.is_admin() {
        return Err(ApiError::Forbidden("Admin access required"));
    }
    let user_id = parse_user_id(user_id)?;

    let details = parse_action_body(&body)?.details();
    if action == VerificationAction::Reject && details.reason.is_none() {
        return Err(ApiError::invalid("reason", "is required when rejecting"));
    }

    let outcome = review::apply_admin_action(&state.store, &principal, user_id, action, details)?;
    Ok(Json(outcome.into()))
}

/// POST /api/verification/:user_id/approve
pub async fn approve<V, S>(
    State(state): State<Arc<AppState<V, S>>>,
    cookies: Cookies,
    headers: HeaderMap,
    Path(user_id): Path<String>,
    body: Bytes,
) -> Result<Json<ActionResponse>, ApiError>
where
    V: VerificationStore,
    S: SessionStore,
{
    admin_action(&state, &cookies, &headers, &user_id, VerificationAction::Approve, body).await
}

/// POST /api/verification/:user_id/reject
pub async fn reject<V, S>(
    State(state): State<Arc<AppState<V, S>>>,
    cookies: Cookies,
    headers: HeaderMap,
    Path(user_id): Path<String>,
    body: Bytes,
) -> Result<Json<ActionResponse>, ApiError>
where
    V: VerificationStore,
    S: SessionStore,
{
    admin_action(&state, &cookies, &headers, &user_id, VerificationAction::Reject, body).await
}

/// POST /api/verification/:user_id/unapprove
pub async fn unapprove<V, S>(
    State(state): State<Arc<AppState<V, S>>>,
    cookies: Cookies,
    headers: HeaderMap,
    Path(user_id): Path<String>,
    body: Bytes,
) -> Result<Json<ActionResponse>, ApiError>
where
    V: VerificationStore,
    S: SessionStore,
{
    admin_action(&state, &cookies, &headers, &user_id, VerificationAction::Unapprove, body).await
}

/// POST /api/verification/:user_id/resubmit
/// Contractor-initiated; admins may record it on a contractor's behalf
pub async fn resubmit<V, S>(
    State(state): State<Arc<AppState<V, S>>>,
    cookies: Cookies,
    headers: HeaderMap,
    Path(user_id): Path<String>,
    body: Bytes,
) -> Result<Json<ActionResponse>, ApiError>
where
    V: VerificationStore,
    S: SessionStore,
{
    let principal = super::session::current_principal(&state, &cookies, &headers)?;
    let user_id = parse_user_id(&user_id)?;
    let details = parse_action_body(&body)?.details();

    let outcome = review::resubmit(&state.store, &principal, user_id, details.reason)?;
    Ok(Json(outcome.into()))
}
