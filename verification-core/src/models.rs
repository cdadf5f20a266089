//! Account roles and verification labels
//!
//! All labels serialize as the lowercase snake_case strings stored in the
//! database and returned over the API.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Marketplace role of an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    EventManager,
    Contractor,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::EventManager => "event_manager",
            Role::Contractor => "contractor",
            Role::Admin => "admin",
        }
    }

    /// Whether accounts with this role go through the verification queue
    pub fn is_reviewable(&self) -> bool {
        !matches!(self, Role::Admin)
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "event_manager" => Ok(Role::EventManager),
            "contractor" => Ok(Role::Contractor),
            "admin" => Ok(Role::Admin),
            other => Err(Error::UnknownRole(other.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An action recorded in the verification log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationAction {
    Approve,
    Reject,
    Resubmit,
    Unapprove,
}

impl VerificationAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationAction::Approve => "approve",
            VerificationAction::Reject => "reject",
            VerificationAction::Resubmit => "resubmit",
            VerificationAction::Unapprove => "unapprove",
        }
    }

    /// Status label written alongside the action
    pub fn status_label(&self) -> &'static str {
        match self {
            VerificationAction::Approve => VerificationStatus::Approved.as_str(),
            VerificationAction::Reject => VerificationStatus::Rejected.as_str(),
            VerificationAction::Resubmit | VerificationAction::Unapprove => {
                VerificationStatus::Pending.as_str()
            }
        }
    }
}

impl FromStr for VerificationAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approve" => Ok(VerificationAction::Approve),
            "reject" => Ok(VerificationAction::Reject),
            "resubmit" => Ok(VerificationAction::Resubmit),
            "unapprove" => Ok(VerificationAction::Unapprove),
            other => Err(Error::UnknownAction(other.to_string())),
        }
    }
}

impl fmt::Display for VerificationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display status of an account in the review workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Pending,
    Approved,
    Rejected,
    Onboarding,
}

impl VerificationStatus {
    pub const ALL: [VerificationStatus; 4] = [
        VerificationStatus::Pending,
        VerificationStatus::Approved,
        VerificationStatus::Rejected,
        VerificationStatus::Onboarding,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Pending => "pending",
            VerificationStatus::Approved => "approved",
            VerificationStatus::Rejected => "rejected",
            VerificationStatus::Onboarding => "onboarding",
        }
    }
}

impl FromStr for VerificationStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(VerificationStatus::Pending),
            "approved" => Ok(VerificationStatus::Approved),
            "rejected" => Ok(VerificationStatus::Rejected),
            "onboarding" => Ok(VerificationStatus::Onboarding),
            other => Err(Error::UnknownStatus(other.to_string())),
        }
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_labels() {
        for role in [Role::EventManager, Role::Contractor, Role::Admin] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert_eq!(
            "vendor".parse::<Role>(),
            Err(Error::UnknownRole("vendor".to_string()))
        );
    }

    #[test]
    fn test_action_status_labels() {
        assert_eq!(VerificationAction::Approve.status_label(), "approved");
        assert_eq!(VerificationAction::Reject.status_label(), "rejected");
        assert_eq!(VerificationAction::Resubmit.status_label(), "pending");
        assert_eq!(VerificationAction::Unapprove.status_label(), "pending");
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&Role::EventManager).unwrap();
        assert_eq!(json, "\"event_manager\"");

        let status: VerificationStatus = serde_json::from_str("\"onboarding\"").unwrap();
        assert_eq!(status, VerificationStatus::Onboarding);
    }

    #[test]
    fn test_admin_not_reviewable() {
        assert!(!Role::Admin.is_reviewable());
        assert!(Role::Contractor.is_reviewable());
        assert!(Role::EventManager.is_reviewable());
    }
}
