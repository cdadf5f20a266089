//! Marketplace verification service
//!
//! HTTP front for the account review workflow: admins work a queue of
//! contractors and event managers, approve/reject/unapprove them, and every
//! status shown is derived by `verification_core::resolve_status`.

pub mod bootstrap;
pub mod config;
pub mod crypto;
pub mod error;
pub mod queue;
pub mod review;
pub mod routes;
pub mod state;
pub mod store;

pub use config::Config;
pub use error::{ApiError, FieldError};
pub use review::{AccountSnapshot, Principal};
pub use state::AppState;
pub use store::{
    InMemorySessionStore, InMemoryVerificationStore, SessionStore, SqliteStore,
    VerificationStore,
};
