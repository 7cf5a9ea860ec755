use std::sync::Arc;

use tracing::warn;

use crate::users::error::UserError;
use crate::users::password::{dummy_hash, hash_password, verify_password};
use crate::users::repo_types::{AuthOutcome, UpdateUser, User};
use crate::users::store::UserStore;

/// The identity core. Owns all reads and writes of user records through the
/// store port and enforces the uniqueness and hashing invariants. It holds no
/// cache or lock of its own; callers may run in other processes, so anything
/// stronger than check-then-act comes from the store's unique index.
pub struct UsersService {
    store: Arc<dyn UserStore>,
}

impl UsersService {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    /// Create a user with a freshly hashed password. The lookup is a
    /// fast-path; two racing registrations can both pass it, and the store's
    /// write-time conflict is what actually decides the loser.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        username: Option<&str>,
    ) -> Result<User, UserError> {
        if self.store.find_by_email(email).await?.is_some() {
            warn!(email = %email, "email already registered");
            return Err(UserError::DuplicateEmail);
        }
        let hash = hash_password(password)?;
        self.store.insert(email, username, &hash).await
    }

    /// Credential check. Unknown email and wrong password both come back as
    /// `Unauthenticated`, and the miss path verifies against a dummy hash so
    /// either cause costs one argon2 verification.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<AuthOutcome, UserError> {
        match self.store.find_by_email(email).await? {
            Some(user) => {
                if verify_password(password, &user.password_hash)? {
                    Ok(AuthOutcome::Authenticated(user))
                } else {
                    warn!(user_id = user.id, "invalid password");
                    Ok(AuthOutcome::Unauthenticated)
                }
            }
            None => {
                let _ = verify_password(password, dummy_hash())?;
                warn!("unknown email");
                Ok(AuthOutcome::Unauthenticated)
            }
        }
    }

    pub async fn list(&self) -> Result<Vec<User>, UserError> {
        self.store.list().await
    }

    pub async fn get(&self, id: i64) -> Result<User, UserError> {
        self.store.find_by_id(id).await?.ok_or(UserError::NotFound)
    }

    /// Apply a field-wise patch. All requested changes land on the fetched
    /// row in memory and are persisted as one wholesale update, so no partial
    /// commit is ever observable.
    pub async fn update(&self, id: i64, patch: UpdateUser) -> Result<User, UserError> {
        let mut user = self.get(id).await?;

        if let Some(email) = patch.email {
            if email != user.email {
                if let Some(other) = self.store.find_by_email(&email).await? {
                    if other.id != id {
                        warn!(user_id = id, email = %email, "email taken by another user");
                        return Err(UserError::DuplicateEmail);
                    }
                }
                user.email = email;
            }
        }
        if let Some(password) = patch.password {
            user.password_hash = hash_password(&password)?;
        }
        if let Some(username) = patch.username {
            user.username = username;
        }

        self.store.update(&user).await
    }

    pub async fn remove(&self, id: i64) -> Result<(), UserError> {
        self.store.delete(id).await
    }
}
