//! Startup seeding

use verification_core::Role;

use crate::config::BootstrapAdmin;
use crate::crypto::hash_password;
use crate::error::ApiError;
use crate::store::{NewUser, User, VerificationStore};

/// Create the configured admin account unless the email is already taken.
///
/// Returns the created admin, or `None` when an account already existed.
pub fn ensure_admin<V: VerificationStore>(
    store: &V,
    admin: &BootstrapAdmin,
) -> Result<Option<User>, ApiError> {
    if let Some(existing) = store.get_user_by_email(&admin.email)? {
        if existing.role != Role::Admin {
            tracing::warn!(email = %admin.email, role = %existing.role, "Bootstrap email belongs to a non-admin account");
        }
        return Ok(None);
    }

    let password_hash =
        hash_password(&admin.password).map_err(|e| ApiError::Internal(e.to_string()))?;
    let user = store.create_user(NewUser {
        email: admin.email.clone(),
        password_hash,
        role: Role::Admin,
        full_name: None,
        company_name: None,
    })?;
    tracing::info!(user_id = %user.id, email = %user.email, "Bootstrap admin created");
    Ok(Some(user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryVerificationStore;

    #[test]
    fn test_ensure_admin_is_idempotent() {
        let store = InMemoryVerificationStore::new();
        let admin = BootstrapAdmin {
            email: "ops@example.com".to_string(),
            password: "correct horse".to_string(),
        };

        let created = ensure_admin(&store, &admin).unwrap().unwrap();
        assert_eq!(created.role, Role::Admin);
        assert!(ensure_admin(&store, &admin).unwrap().is_none());
        assert_eq!(store.list_users(Some(Role::Admin)).unwrap().len(), 1);
    }
}
