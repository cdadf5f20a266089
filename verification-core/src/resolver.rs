//! Verification status resolution
//!
//! Classifies an account into exactly one display status from its
//! verification flags, onboarding progress and log history. Rules are
//! checked in priority order and the first match wins:
//!
//! 1. a verified flag is set: `approved`
//! 2. a rejection is not overridden by a strictly newer approval: `rejected`
//! 3. never approved and onboarding incomplete: `onboarding`
//! 4. otherwise: `pending`
//!
//! The "never approved" guard in rule 3 keeps an account that was approved
//! and later unapproved from falling back into onboarding when its
//! onboarding flags are stale.

use serde::{Deserialize, Serialize};

use crate::log::{LogSummary, VerificationLogEntry};
use crate::models::{Role, VerificationStatus};

/// Everything the resolver looks at for one account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusInput {
    pub role: Role,
    /// `BusinessProfile.is_verified`; false for accounts without one
    #[serde(default)]
    pub is_business_verified: bool,
    /// `User.is_verified`
    #[serde(default)]
    pub is_user_verified: bool,
    /// `None` when no onboarding row exists yet
    #[serde(default)]
    pub onboarding_submitted: Option<bool>,
    /// Event-manager onboarding flag from profile preferences
    #[serde(default)]
    pub onboarding_completed_flag: Option<bool>,
    /// Log history, any order
    #[serde(default)]
    pub log: Vec<VerificationLogEntry>,
}

impl StatusInput {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            is_business_verified: false,
            is_user_verified: false,
            onboarding_submitted: None,
            onboarding_completed_flag: None,
            log: Vec::new(),
        }
    }

    pub fn resolve(&self) -> VerificationStatus {
        resolve_status(self)
    }
}

/// Resolve the display status of an account. Total over all inputs.
pub fn resolve_status(input: &StatusInput) -> VerificationStatus {
    if input.is_business_verified || input.is_user_verified {
        return VerificationStatus::Approved;
    }

    let summary = LogSummary::from_entries(&input.log);
    if summary.rejection_in_force() {
        return VerificationStatus::Rejected;
    }

    if !summary.ever_approved() && onboarding_incomplete(input) {
        return VerificationStatus::Onboarding;
    }

    VerificationStatus::Pending
}

fn onboarding_incomplete(input: &StatusInput) -> bool {
    match input.role {
        Role::Contractor => input.onboarding_submitted != Some(true),
        Role::EventManager => input.onboarding_completed_flag != Some(true),
        Role::Admin => false,
    }
}
