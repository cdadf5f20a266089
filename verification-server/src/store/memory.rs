//! In-memory storage implementations

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use chrono::Utc;
use uuid::Uuid;
use verification_core::{
    next_timestamp, NewLogEntry, OnboardingStatus, Role, VerificationLogEntry,
};

use super::{
    BusinessProfile, FlagChange, NewUser, Profile, Session, SessionId, SessionStore, StoreResult,
    User, UserId, VerificationStore,
};
use crate::error::ApiError;

fn poisoned<T>(_: PoisonError<T>) -> ApiError {
    ApiError::Internal("store lock poisoned".to_string())
}

#[derive(Default)]
struct Tables {
    users: HashMap<UserId, User>,
    /// Lowercased email -> user
    emails: HashMap<String, UserId>,
    business_profiles: HashMap<UserId, BusinessProfile>,
    profiles: HashMap<UserId, Profile>,
    onboarding: HashMap<UserId, OnboardingStatus>,
    /// Oldest first
    logs: HashMap<UserId, Vec<VerificationLogEntry>>,
}

/// In-memory verification store.
///
/// All tables sit behind one lock so a flag change and its log entry are
/// observed together.
#[derive(Default)]
pub struct InMemoryVerificationStore {
    tables: RwLock<Tables>,
}

impl InMemoryVerificationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl VerificationStore for InMemoryVerificationStore {
    fn create_user(&self, new_user: NewUser) -> StoreResult<User> {
        let normalized = new_user.email.to_lowercase();
        let mut tables = self.tables.write().map_err(poisoned)?;
        if tables.emails.contains_key(&normalized) {
            return Err(ApiError::EmailAlreadyExists);
        }

        let now = Utc::now();
        let user = User {
            id: UserId::new(),
            email: normalized.clone(),
            password_hash: new_user.password_hash,
            role: new_user.role,
            is_verified: false,
            created_at: now,
        };

        if let (Role::Contractor, Some(company_name)) = (user.role, new_user.company_name) {
            tables.business_profiles.insert(
                user.id,
                BusinessProfile {
                    user_id: user.id,
                    company_name,
                    is_verified: false,
                    verification_date: None,
                    created_at: now,
                },
            );
        }
        tables
            .profiles
            .insert(user.id, Profile::new(user.id, new_user.full_name));
        tables.emails.insert(normalized, user.id);
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    fn get_user(&self, user_id: UserId) -> StoreResult<Option<User>> {
        let tables = self.tables.read().map_err(poisoned)?;
        Ok(tables.users.get(&user_id).cloned())
    }

    fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().map_err(poisoned)?;
        Ok(tables
            .emails
            .get(&email.to_lowercase())
            .and_then(|id| tables.users.get(id))
            .cloned())
    }

    fn list_users(&self, role: Option<Role>) -> StoreResult<Vec<User>> {
        let tables = self.tables.read().map_err(poisoned)?;
        let mut users: Vec<User> = tables
            .users
            .values()
            .filter(|u| role.map_or(true, |r| u.role == r))
            .cloned()
            .collect();
        users.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.email.cmp(&b.email))
        });
        Ok(users)
    }

    fn get_business_profile(&self, user_id: UserId) -> StoreResult<Option<BusinessProfile>> {
        let tables = self.tables.read().map_err(poisoned)?;
        Ok(tables.business_profiles.get(&user_id).cloned())
    }

    fn get_profile(&self, user_id: UserId) -> StoreResult<Option<Profile>> {
        let tables = self.tables.read().map_err(poisoned)?;
        Ok(tables.profiles.get(&user_id).cloned())
    }

    fn set_onboarding_completed(&self, user_id: UserId, completed: bool) -> StoreResult<()> {
        let mut tables = self.tables.write().map_err(poisoned)?;
        if !tables.users.contains_key(&user_id) {
            return Err(ApiError::UserNotFound);
        }
        tables
            .profiles
            .entry(user_id)
            .or_insert_with(|| Profile::new(user_id, None))
            .set_onboarding_completed(completed);
        Ok(())
    }

    fn get_onboarding(&self, user_id: UserId) -> StoreResult<Option<OnboardingStatus>> {
        let tables = self.tables.read().map_err(poisoned)?;
        Ok(tables.onboarding.get(&user_id).cloned())
    }

    fn upsert_onboarding(&self, status: &OnboardingStatus) -> StoreResult<()> {
        let user_id = UserId(status.user_id);
        let mut tables = self.tables.write().map_err(poisoned)?;
        if !tables.users.contains_key(&user_id) {
            return Err(ApiError::UserNotFound);
        }
        tables.onboarding.insert(user_id, status.clone());
        Ok(())
    }

    fn list_verification_logs(&self, user_id: UserId) -> StoreResult<Vec<VerificationLogEntry>> {
        let tables = self.tables.read().map_err(poisoned)?;
        Ok(tables
            .logs
            .get(&user_id)
            .map(|entries| entries.iter().rev().cloned().collect())
            .unwrap_or_default())
    }

    fn apply_verification_action(
        &self,
        flags: FlagChange,
        entry: NewLogEntry,
    ) -> StoreResult<VerificationLogEntry> {
        let user_id = UserId(entry.user_id);
        let mut tables = self.tables.write().map_err(poisoned)?;
        if !tables.users.contains_key(&user_id) {
            return Err(ApiError::UserNotFound);
        }

        let latest = tables
            .logs
            .get(&user_id)
            .and_then(|entries| entries.last())
            .map(|e| e.created_at);
        let entry = entry.into_entry(next_timestamp(Utc::now(), latest));

        if let Some(verified) = flags.user_verified {
            if let Some(user) = tables.users.get_mut(&user_id) {
                user.is_verified = verified;
            }
        }
        if let Some(verified) = flags.business_verified {
            if let Some(profile) = tables.business_profiles.get_mut(&user_id) {
                profile.is_verified = verified;
                profile.verification_date = verified.then_some(entry.created_at);
            }
        }

        tables.logs.entry(user_id).or_default().push(entry.clone());
        Ok(entry)
    }
}

/// In-memory session store
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<SessionId, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for InMemorySessionStore {
    fn create(&self, user_id: UserId) -> StoreResult<Session> {
        let session = Session {
            id: SessionId(Uuid::new_v4().to_string()),
            user_id,
            created_at: Utc::now(),
        };
        self.sessions
            .write()
            .map_err(poisoned)?
            .insert(session.id.clone(), session.clone());
        Ok(session)
    }

    fn get(&self, session_id: &SessionId) -> StoreResult<Option<Session>> {
        Ok(self.sessions.read().map_err(poisoned)?.get(session_id).cloned())
    }

    fn delete(&self, session_id: &SessionId) -> StoreResult<()> {
        self.sessions.write().map_err(poisoned)?.remove(session_id);
        Ok(())
    }
}
