//! Shared application state

use crate::store::{SessionStore, VerificationStore};

/// State handed to every route handler
pub struct AppState<V, S>
where
    V: VerificationStore,
    S: SessionStore,
{
    /// Accounts, profiles, onboarding and the verification log
    pub store: V,
    pub session_store: S,
    /// Bearer token for the non-persisted service admin; `None` disables it
    pub admin_token: Option<String>,
}

impl<V, S> AppState<V, S>
where
    V: VerificationStore,
    S: SessionStore,
{
    pub fn new(store: V, session_store: S, admin_token: Option<String>) -> Self {
        Self {
            store,
            session_store,
            admin_token: admin_token.filter(|t| !t.is_empty()),
        }
    }
}
