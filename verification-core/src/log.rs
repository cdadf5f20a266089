//! Verification log entries
//!
//! The log is append-only: one entry per admin or self-service action,
//! never updated or removed. Resolution reads it as "most recent action wins".

use chrono::{DateTime, Duration, DurationRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{VerificationAction, VerificationStatus};

/// A recorded verification action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationLogEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub action: VerificationAction,
    /// Status label written with the action (`approved`, `rejected`, `pending`)
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    /// Acting admin; absent when the actor is not a stored user
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl VerificationLogEntry {
    pub fn is_approval(&self) -> bool {
        self.action == VerificationAction::Approve
            || self.status == VerificationStatus::Approved.as_str()
    }

    pub fn is_rejection(&self) -> bool {
        self.action == VerificationAction::Reject
            || self.status == VerificationStatus::Rejected.as_str()
    }
}

/// An entry about to be appended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLogEntry {
    pub user_id: Uuid,
    pub action: VerificationAction,
    pub reason: Option<String>,
    pub feedback: Option<String>,
    pub admin_id: Option<Uuid>,
}

impl NewLogEntry {
    pub fn new(user_id: Uuid, action: VerificationAction) -> Self {
        Self {
            user_id,
            action,
            reason: None,
            feedback: None,
            admin_id: None,
        }
    }

    pub fn with_reason(mut self, reason: Option<String>) -> Self {
        self.reason = reason;
        self
    }

    pub fn with_feedback(mut self, feedback: Option<String>) -> Self {
        self.feedback = feedback;
        self
    }

    pub fn with_admin(mut self, admin_id: Option<Uuid>) -> Self {
        self.admin_id = admin_id;
        self
    }

    /// Materialize the entry with a fresh id at the given time
    pub fn into_entry(self, created_at: DateTime<Utc>) -> VerificationLogEntry {
        VerificationLogEntry {
            id: Uuid::new_v4(),
            user_id: self.user_id,
            action: self.action,
            status: self.action.status_label().to_string(),
            reason: self.reason,
            feedback: self.feedback,
            admin_id: self.admin_id,
            created_at,
        }
    }
}

/// Timestamp for the next entry of a user whose latest entry is `latest`.
///
/// Truncated to microseconds (the precision stores keep) and always strictly
/// after `latest`, so a user's entries never share a timestamp.
pub fn next_timestamp(now: DateTime<Utc>, latest: Option<DateTime<Utc>>) -> DateTime<Utc> {
    let step = Duration::microseconds(1);
    let now = now.duration_trunc(step).unwrap_or(now);
    match latest {
        Some(latest) if latest >= now => latest + step,
        _ => now,
    }
}

/// Most recent entry of each kind in a user's history
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSummary<'a> {
    pub latest: Option<&'a VerificationLogEntry>,
    pub latest_approval: Option<&'a VerificationLogEntry>,
    pub latest_rejection: Option<&'a VerificationLogEntry>,
    pub latest_resubmit: Option<&'a VerificationLogEntry>,
}

impl<'a> LogSummary<'a> {
    /// Summarize entries in any order
    pub fn from_entries(entries: &'a [VerificationLogEntry]) -> Self {
        fn newer<'e>(
            current: Option<&'e VerificationLogEntry>,
            candidate: &'e VerificationLogEntry,
        ) -> Option<&'e VerificationLogEntry> {
            match current {
                Some(c) if c.created_at >= candidate.created_at => Some(c),
                _ => Some(candidate),
            }
        }

        let mut summary = LogSummary::default();
        for entry in entries {
            summary.latest = newer(summary.latest, entry);
            if entry.is_approval() {
                summary.latest_approval = newer(summary.latest_approval, entry);
            }
            if entry.is_rejection() {
                summary.latest_rejection = newer(summary.latest_rejection, entry);
            }
            if entry.action == VerificationAction::Resubmit {
                summary.latest_resubmit = newer(summary.latest_resubmit, entry);
            }
        }
        summary
    }

    pub fn ever_approved(&self) -> bool {
        self.latest_approval.is_some()
    }

    /// A rejection is in force unless an approval is strictly newer
    pub fn rejection_in_force(&self) -> bool {
        match (self.latest_rejection, self.latest_approval) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(rejection), Some(approval)) => approval.created_at <= rejection.created_at,
        }
    }

    /// A resubmission arrived after the latest rejection
    pub fn resubmitted_since_rejection(&self) -> bool {
        match (self.latest_resubmit, self.latest_rejection) {
            (Some(resubmit), Some(rejection)) => resubmit.created_at > rejection.created_at,
            _ => false,
        }
    }
}
