//! User account model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A registered user account.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    /// Stable identifier; also names the user's storage directory.
    pub id: Uuid,
    /// Unique login name (max 25 characters).
    pub username: String,
    /// Argon2id password hash. Never serialized into responses.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Account creation time.
    pub created_at: DateTime<Utc>,
}
