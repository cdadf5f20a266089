//! Error types for verification-core

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    #[error("Unknown verification action: {0}")]
    UnknownAction(String),

    #[error("Unknown verification status: {0}")]
    UnknownStatus(String),

    #[error("Invalid onboarding step {0} (expected 1 to 4)")]
    InvalidStep(u8),
}
