//! Storage abstractions for the verification service

pub mod memory;
pub mod models;
pub mod sqlite;

pub use memory::{InMemorySessionStore, InMemoryVerificationStore};
pub use models::*;
pub use sqlite::SqliteStore;

use std::sync::Arc;

use verification_core::{NewLogEntry, OnboardingStatus, Role, VerificationLogEntry};

use crate::error::ApiError;

/// Result type for store operations
pub type StoreResult<T> = Result<T, ApiError>;

/// Trait for accounts, profiles, onboarding and the verification log
pub trait VerificationStore: Send + Sync {
    /// Create a user with its profile (and business profile for contractors)
    fn create_user(&self, new_user: NewUser) -> StoreResult<User>;

    /// Get a user by ID
    fn get_user(&self, user_id: UserId) -> StoreResult<Option<User>>;

    /// Get a user by email address (case-insensitive)
    fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// List users, newest signup first, optionally restricted to one role
    fn list_users(&self, role: Option<Role>) -> StoreResult<Vec<User>>;

    /// Get a contractor's business profile
    fn get_business_profile(&self, user_id: UserId) -> StoreResult<Option<BusinessProfile>>;

    /// Get a user's general profile
    fn get_profile(&self, user_id: UserId) -> StoreResult<Option<Profile>>;

    /// Write the event-manager onboarding flag into profile preferences
    fn set_onboarding_completed(&self, user_id: UserId, completed: bool) -> StoreResult<()>;

    /// Get a user's onboarding row
    fn get_onboarding(&self, user_id: UserId) -> StoreResult<Option<OnboardingStatus>>;

    /// Insert or replace a user's onboarding row
    fn upsert_onboarding(&self, status: &OnboardingStatus) -> StoreResult<()>;

    /// All log entries for a user, newest first
    fn list_verification_logs(&self, user_id: UserId) -> StoreResult<Vec<VerificationLogEntry>>;

    /// Apply flag changes and append the log entry as one atomic write.
    ///
    /// Fails with `UserNotFound` when the entry's user does not exist; in
    /// that case nothing is written.
    fn apply_verification_action(
        &self,
        flags: FlagChange,
        entry: NewLogEntry,
    ) -> StoreResult<VerificationLogEntry>;
}

/// Trait for session storage
pub trait SessionStore: Send + Sync {
    /// Create a new session for a user
    fn create(&self, user_id: UserId) -> StoreResult<Session>;

    /// Get a session by ID
    fn get(&self, session_id: &SessionId) -> StoreResult<Option<Session>>;

    /// Delete a session
    fn delete(&self, session_id: &SessionId) -> StoreResult<()>;
}

// Shared handles let one SqliteStore back both traits, and let tests keep a
// reference to the store the router uses.
impl<T: VerificationStore + ?Sized> VerificationStore for Arc<T> {
    fn create_user(&self, new_user: NewUser) -> StoreResult<User> {
        (**self).create_user(new_user)
    }

    fn get_user(&self, user_id: UserId) -> StoreResult<Option<User>> {
        (**self).get_user(user_id)
    }

    fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        (**self).get_user_by_email(email)
    }

    fn list_users(&self, role: Option<Role>) -> StoreResult<Vec<User>> {
        (**self).list_users(role)
    }

    fn get_business_profile(&self, user_id: UserId) -> StoreResult<Option<BusinessProfile>> {
        (**self).get_business_profile(user_id)
    }

    fn get_profile(&self, user_id: UserId) -> StoreResult<Option<Profile>> {
        (**self).get_profile(user_id)
    }

    fn set_onboarding_completed(&self, user_id: UserId, completed: bool) -> StoreResult<()> {
        (**self).set_onboarding_completed(user_id, completed)
    }

    fn get_onboarding(&self, user_id: UserId) -> StoreResult<Option<OnboardingStatus>> {
        (**self).get_onboarding(user_id)
    }

    fn upsert_onboarding(&self, status: &OnboardingStatus) -> StoreResult<()> {
        (**self).upsert_onboarding(status)
    }

    fn list_verification_logs(&self, user_id: UserId) -> StoreResult<Vec<VerificationLogEntry>> {
        (**self).list_verification_logs(user_id)
    }

    fn apply_verification_action(
        &self,
        flags: FlagChange,
        entry: NewLogEntry,
    ) -> StoreResult<VerificationLogEntry> {
        (**self).apply_verification_action(flags, entry)
    }
}

impl<T: SessionStore + ?Sized> SessionStore for Arc<T> {
    fn create(&self, user_id: UserId) -> StoreResult<Session> {
        (**self).create(user_id)
    }

    fn get(&self, session_id: &SessionId) -> StoreResult<Option<Session>> {
        (**self).get(session_id)
    }

    fn delete(&self, session_id: &SessionId) -> StoreResult<()> {
        (**self).delete(session_id)
    }
}
