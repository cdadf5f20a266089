//! Review workflow: status snapshots and the admin/contractor actions
//!
//! Every status shown by the service goes through [`AccountSnapshot`], which
//! gathers the rows the resolver needs and hands them to
//! `verification_core::resolve_status`.

use uuid::Uuid;
use verification_core::{
    admin_id_from_str, LogSummary, NewLogEntry, OnboardingStatus, Role, StatusInput,
    VerificationAction, VerificationLogEntry, VerificationStatus,
};

use crate::error::ApiError;
use crate::store::{
    BusinessProfile, FlagChange, Profile, StoreResult, User, UserId, VerificationStore,
};

/// Who is making a request
#[derive(Debug, Clone)]
pub enum Principal {
    /// A signed-in account
    User(User),
    /// Holder of the configured admin token; not a stored user.
    /// `acting_as` is the raw `X-Admin-Id` header, if any.
    Service { acting_as: Option<String> },
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        match self {
            Principal::User(user) => user.role == Role::Admin,
            Principal::Service { .. } => true,
        }
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            Principal::User(user) => Some(user),
            Principal::Service { .. } => None,
        }
    }

    /// Admins may see anyone; other accounts only themselves
    pub fn can_view(&self, user_id: UserId) -> bool {
        self.is_admin() || self.user().is_some_and(|u| u.id == user_id)
    }
}

/// `admin_id` to record for an action by `principal`.
///
/// A service principal contributes its `X-Admin-Id` only when the value is
/// UUID-shaped and names a stored admin; otherwise the field is omitted.
pub fn log_admin_id<V: VerificationStore>(
    store: &V,
    principal: &Principal,
) -> StoreResult<Option<Uuid>> {
    match principal {
        Principal::User(user) => Ok(Some(user.id.0)),
        Principal::Service { acting_as } => {
            let Some(candidate) = acting_as.as_deref().and_then(admin_id_from_str) else {
                return Ok(None);
            };
            let admin = store
                .get_user(UserId(candidate))?
                .filter(|u| u.role == Role::Admin);
            if admin.is_none() {
                tracing::debug!(%candidate, "X-Admin-Id is not a stored admin, omitting");
            }
            Ok(admin.map(|u| u.id.0))
        }
    }
}

/// All rows that feed status resolution for one account
#[derive(Debug, Clone)]
pub struct AccountSnapshot {
    pub user: User,
    pub business_profile: Option<BusinessProfile>,
    pub onboarding: Option<OnboardingStatus>,
    pub profile: Option<Profile>,
    /// Newest first
    pub log: Vec<VerificationLogEntry>,
}

impl AccountSnapshot {
    pub fn load<V: VerificationStore>(store: &V, user: User) -> StoreResult<Self> {
        let business_profile = store.get_business_profile(user.id)?;
        let onboarding = store.get_onboarding(user.id)?;
        let profile = store.get_profile(user.id)?;
        let log = store.list_verification_logs(user.id)?;
        Ok(Self {
            user,
            business_profile,
            onboarding,
            profile,
            log,
        })
    }

    pub fn load_by_id<V: VerificationStore>(store: &V, user_id: UserId) -> Result<Self, ApiError> {
        let user = store.get_user(user_id)?.ok_or(ApiError::UserNotFound)?;
        Self::load(store, user)
    }

    pub fn onboarding_completed_flag(&self) -> Option<bool> {
        self.profile.as_ref().and_then(Profile::onboarding_completed)
    }

    pub fn status_input(&self) -> StatusInput {
        StatusInput {
            role: self.user.role,
            is_business_verified: self
                .business_profile
                .as_ref()
                .is_some_and(|b| b.is_verified),
            is_user_verified: self.user.is_verified,
            onboarding_submitted: self.onboarding.as_ref().map(|o| o.is_submitted),
            onboarding_completed_flag: self.onboarding_completed_flag(),
            log: self.log.clone(),
        }
    }

    pub fn status(&self) -> VerificationStatus {
        self.status_input().resolve()
    }

    pub fn summary(&self) -> LogSummary<'_> {
        LogSummary::from_entries(&self.log)
    }
}

/// Result of a recorded action
#[derive(Debug, Clone)]
pub struct ActionOutcome {
    pub entry: VerificationLogEntry,
    pub status: VerificationStatus,
}

/// Free-text fields accompanying an action
#[derive(Debug, Clone, Default)]
pub struct ActionDetails {
    pub reason: Option<String>,
    pub feedback: Option<String>,
}

fn flags_for(action: VerificationAction) -> FlagChange {
    match action {
        VerificationAction::Approve => FlagChange::set_all(true),
        VerificationAction::Reject | VerificationAction::Unapprove => FlagChange::set_all(false),
        VerificationAction::Resubmit => FlagChange::none(),
    }
}

/// Approve, reject or unapprove an account as an admin
pub fn apply_admin_action<V: VerificationStore>(
    store: &V,
    principal: &Principal,
    target: UserId,
    action: VerificationAction,
    details: ActionDetails,
) -> Result<ActionOutcome, ApiError> {
    if !principal.is_admin() {
        return Err(ApiError::Forbidden("Admin access required"));
    }
    if action == VerificationAction::Resubmit {
        return resubmit(store, principal, target, details.reason);
    }

    let user = store.get_user(target)?.ok_or(ApiError::UserNotFound)?;
    if !user.role.is_reviewable() {
        return Err(ApiError::invalid(
            "user_id",
            "admin accounts are not subject to verification",
        ));
    }

    let admin_id = log_admin_id(store, principal)?;
    let entry = NewLogEntry::new(target.0, action)
        .with_reason(details.reason)
        .with_feedback(details.feedback)
        .with_admin(admin_id);
    let entry = store.apply_verification_action(flags_for(action), entry)?;

    tracing::info!(
        user_id = %target,
        action = %action,
        admin_id = ?admin_id,
        "Verification action recorded"
    );

    let status = AccountSnapshot::load_by_id(store, target)?.status();
    Ok(ActionOutcome { entry, status })
}

/// Record a contractor's resubmission for review. Flags are left untouched.
pub fn resubmit<V: VerificationStore>(
    store: &V,
    principal: &Principal,
    target: UserId,
    notes: Option<String>,
) -> Result<ActionOutcome, ApiError> {
    let is_self = principal.user().is_some_and(|u| u.id == target);
    if !is_self && !principal.is_admin() {
        return Err(ApiError::Forbidden("Only the account owner can resubmit"));
    }

    let user = store.get_user(target)?.ok_or(ApiError::UserNotFound)?;
    if user.role != Role::Contractor {
        return Err(ApiError::invalid(
            "user_id",
            "only contractor accounts can resubmit for verification",
        ));
    }

    let entry = NewLogEntry::new(target.0, VerificationAction::Resubmit).with_reason(notes);
    let entry = store.apply_verification_action(FlagChange::none(), entry)?;

    tracing::info!(user_id = %target, "Verification resubmitted");

    let status = AccountSnapshot::load_by_id(store, target)?.status();
    Ok(ActionOutcome { entry, status })
}
