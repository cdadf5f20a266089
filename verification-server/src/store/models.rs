//! Data models for verification storage

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use verification_core::Role;

/// Preferences key holding the event-manager onboarding flag
pub const ONBOARDING_COMPLETED_KEY: &str = "onboarding_completed";

/// Unique user identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Unique session identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

/// A marketplace account
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    /// Denormalized for contractors; the business profile flag is authoritative
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields needed to create an account
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub full_name: Option<String>,
    /// Required for contractors, ignored otherwise
    pub company_name: Option<String>,
}

/// Contractor company record with its own verification flag
#[derive(Debug, Clone, Serialize)]
pub struct BusinessProfile {
    pub user_id: UserId,
    pub company_name: String,
    pub is_verified: bool,
    pub verification_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// General profile; every account has one
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub user_id: UserId,
    pub full_name: Option<String>,
    pub preferences: serde_json::Value,
}

impl Profile {
    pub fn new(user_id: UserId, full_name: Option<String>) -> Self {
        Self {
            user_id,
            full_name,
            preferences: serde_json::json!({}),
        }
    }

    /// Event-manager onboarding flag, `None` when never written
    pub fn onboarding_completed(&self) -> Option<bool> {
        self.preferences
            .get(ONBOARDING_COMPLETED_KEY)
            .and_then(serde_json::Value::as_bool)
    }

    pub fn set_onboarding_completed(&mut self, completed: bool) {
        if !self.preferences.is_object() {
            self.preferences = serde_json::json!({});
        }
        if let Some(prefs) = self.preferences.as_object_mut() {
            prefs.insert(ONBOARDING_COMPLETED_KEY.to_string(), completed.into());
        }
    }
}

/// Flag writes performed together with a log append
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlagChange {
    pub user_verified: Option<bool>,
    /// Ignored for accounts without a business profile
    pub business_verified: Option<bool>,
}

impl FlagChange {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn set_all(verified: bool) -> Self {
        Self {
            user_verified: Some(verified),
            business_verified: Some(verified),
        }
    }
}

/// A user session
#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_onboarding_flag() {
        let mut profile = Profile::new(UserId::new(), None);
        assert_eq!(profile.onboarding_completed(), None);

        profile.set_onboarding_completed(true);
        assert_eq!(profile.onboarding_completed(), Some(true));
        assert_eq!(profile.preferences["onboarding_completed"], true);
    }

    #[test]
    fn test_profile_flag_ignores_non_bool() {
        let mut profile = Profile::new(UserId::new(), None);
        profile.preferences = serde_json::json!({ "onboarding_completed": "yes" });
        assert_eq!(profile.onboarding_completed(), None);

        profile.preferences = serde_json::Value::Null;
        profile.set_onboarding_completed(false);
        assert_eq!(profile.onboarding_completed(), Some(false));
    }
}
