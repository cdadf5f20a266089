//! Admin review queue

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use verification_core::{Role, VerificationAction, VerificationStatus};

use crate::error::{ApiError, FieldError};
use crate::review::AccountSnapshot;
use crate::store::{User, UserId, VerificationStore};

pub const DEFAULT_PER_PAGE: u32 = 20;
pub const MAX_PER_PAGE: u32 = 100;

/// Query string of `GET /api/verification/queue`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueueQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub status: Option<String>,
    pub role: Option<String>,
}

/// Validated queue filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueFilter {
    pub page: u32,
    pub per_page: u32,
    pub status: Option<VerificationStatus>,
    pub role: Option<Role>,
}

impl TryFrom<QueueQuery> for QueueFilter {
    type Error = ApiError;

    fn try_from(query: QueueQuery) -> Result<Self, Self::Error> {
        let mut errors = Vec::new();

        let page = query.page.unwrap_or(1);
        if page == 0 {
            errors.push(FieldError::new("page", "must be at least 1"));
        }

        let per_page = query.per_page.unwrap_or(DEFAULT_PER_PAGE);
        if per_page == 0 || per_page > MAX_PER_PAGE {
            errors.push(FieldError::new(
                "per_page",
                format!("must be between 1 and {}", MAX_PER_PAGE),
            ));
        }

        let status = match query.status.as_deref().filter(|s| !s.is_empty()) {
            None => None,
            Some(raw) => match raw.parse::<VerificationStatus>() {
                Ok(status) => Some(status),
                Err(e) => {
                    errors.push(FieldError::new("status", e.to_string()));
                    None
                }
            },
        };

        let role = match query.role.as_deref().filter(|s| !s.is_empty()) {
            None => None,
            Some(raw) => match raw.parse::<Role>() {
                Ok(role) if role.is_reviewable() => Some(role),
                Ok(_) => {
                    errors.push(FieldError::new("role", "admins are not in the queue"));
                    None
                }
                Err(e) => {
                    errors.push(FieldError::new("role", e.to_string()));
                    None
                }
            },
        };

        if !errors.is_empty() {
            return Err(ApiError::Validation(errors));
        }

        Ok(Self {
            page,
            per_page,
            status,
            role,
        })
    }
}

/// One account in the queue
#[derive(Debug, Clone, Serialize)]
pub struct QueueItem {
    pub user_id: UserId,
    pub email: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    pub is_verified: bool,
    pub business_verified: bool,
    pub verification_status: VerificationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_action: Option<VerificationAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_action_at: Option<DateTime<Utc>>,
    /// A resubmission is waiting on top of the latest rejection
    pub resubmitted: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&AccountSnapshot> for QueueItem {
    fn from(snapshot: &AccountSnapshot) -> Self {
        let summary = snapshot.summary();
        let business = snapshot.business_profile.as_ref();
        Self {
            user_id: snapshot.user.id,
            email: snapshot.user.email.clone(),
            role: snapshot.user.role,
            company_name: business.map(|b| b.company_name.clone()),
            is_verified: snapshot.user.is_verified,
            business_verified: business.is_some_and(|b| b.is_verified),
            verification_status: snapshot.status(),
            last_action: summary.latest.map(|e| e.action),
            last_action_at: summary.latest.map(|e| e.created_at),
            resubmitted: summary.resubmitted_since_rejection(),
            created_at: snapshot.user.created_at,
        }
    }
}

/// Per-status totals before status filtering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub pending: u64,
    pub approved: u64,
    pub rejected: u64,
    pub onboarding: u64,
}

impl StatusCounts {
    fn add(&mut self, status: VerificationStatus) {
        match status {
            VerificationStatus::Pending => self.pending += 1,
            VerificationStatus::Approved => self.approved += 1,
            VerificationStatus::Rejected => self.rejected += 1,
            VerificationStatus::Onboarding => self.onboarding += 1,
        }
    }
}

/// A page of the queue
#[derive(Debug, Clone, Serialize)]
pub struct QueuePage {
    pub items: Vec<QueueItem>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
    pub counts: StatusCounts,
}

fn reviewable(users: Vec<User>) -> impl Iterator<Item = User> {
    users.into_iter().filter(|u| u.role.is_reviewable())
}

/// Resolve every reviewable account, filter, and cut out one page
pub fn fetch_queue<V: VerificationStore>(
    store: &V,
    filter: &QueueFilter,
) -> Result<QueuePage, ApiError> {
    let mut counts = StatusCounts::default();
    let mut matching = Vec::new();

    for user in reviewable(store.list_users(filter.role)?) {
        let snapshot = AccountSnapshot::load(store, user)?;
        let item = QueueItem::from(&snapshot);
        counts.add(item.verification_status);
        if filter.status.map_or(true, |s| s == item.verification_status) {
            matching.push(item);
        }
    }

    let total = matching.len() as u64;
    let skip = (filter.page as usize - 1).saturating_mul(filter.per_page as usize);
    let items = matching
        .into_iter()
        .skip(skip)
        .take(filter.per_page as usize)
        .collect();

    Ok(QueuePage {
        items,
        total,
        page: filter.page,
        per_page: filter.per_page,
        counts,
    })
}
