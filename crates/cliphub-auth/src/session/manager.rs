//! Account and session orchestration over the repository and the store.

use std::sync::Arc;

use tracing::info;

use cliphub_core::error::AppError;
use cliphub_core::result::AppResult;
use cliphub_core::types::id::{SessionToken, UserId};
use cliphub_database::repositories::user::UserRepository;
use cliphub_entity::User;

use crate::password::PasswordHasher;
use super::record::Session;
use super::store::SessionStore;

/// Ties credential checks to session issuance.
///
/// The store handles pure in-memory session state; this layer adds the
/// database-backed flows (register, login, account deletion).
#[derive(Clone)]
pub struct SessionManager {
    users: UserRepository,
    hasher: PasswordHasher,
    store: Arc<SessionStore>,
}

impl SessionManager {
    /// Creates a new manager.
    pub fn new(users: UserRepository, hasher: PasswordHasher, store: Arc<SessionStore>) -> Self {
        Self {
            users,
            hasher,
            store,
        }
    }

    /// The underlying session store.
    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Creates an account and logs it straight in.
    ///
    /// A duplicate username surfaces as a conflict from the repository.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        remember: bool,
    ) -> AppResult<(User, Session)> {
        let hash = self.hasher.hash_password(password)?;
        let user = self.users.create(username, &hash).await?;
        let session = self.store.create(user.id, &user.username, remember)?;

        info!(user_id = %user.id, username = %user.username, "User registered");
        Ok((user, session))
    }

    /// Verifies credentials and issues a session.
    ///
    /// An unknown username and a wrong password produce the same error,
    /// so the response does not reveal which accounts exist.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        remember: bool,
    ) -> AppResult<(User, Session)> {
        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(invalid_credentials)?;

        if !self.hasher.verify_password(password, &user.password_hash)? {
            return Err(invalid_credentials());
        }

        let session = self.store.create(user.id, &user.username, remember)?;
        info!(user_id = %user.id, username = %user.username, "User logged in");
        Ok((user, session))
    }

    /// Ends one session. Unknown tokens are a no-op.
    pub fn logout(&self, token: &SessionToken) {
        if let Some(session) = self.store.remove(token) {
            info!(user_id = %session.user_id, "User logged out");
        }
    }

    /// Deletes the account row and terminates every session the user has.
    ///
    /// Clip and file rows cascade with the user row; on-disk files are the
    /// caller's concern.
    pub async fn delete_account(&self, user_id: UserId) -> AppResult<()> {
        if !self.users.delete(user_id).await? {
            return Err(AppError::not_found("User not found"));
        }
        let ended = self.store.remove_user_sessions(user_id);
        info!(user_id = %user_id, sessions = ended, "Account deleted");
        Ok(())
    }
}

fn invalid_credentials() -> AppError {
    AppError::unauthorized("Invalid username or password")
}
