//! Marketplace verification core
//!
//! Domain rules for the account review workflow:
//! - Admins approve, reject or unapprove accounts; contractors resubmit
//! - Every action is appended to an immutable per-user log
//! - A single pure resolver derives the display status from flags and log

pub mod actor;
pub mod error;
pub mod log;
pub mod models;
pub mod onboarding;
pub mod resolver;

pub use actor::admin_id_from_str;
pub use error::Error;
pub use log::{next_timestamp, LogSummary, NewLogEntry, VerificationLogEntry};
pub use models::{Role, VerificationAction, VerificationStatus};
pub use onboarding::OnboardingStatus;
pub use resolver::{resolve_status, StatusInput};

/// Result type for verification-core operations
pub type Result<T> = std::result::Result<T, Error>;
