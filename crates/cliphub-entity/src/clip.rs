//! Clipboard entry model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A single clipboard entry.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Clip {
    /// Entry identifier.
    pub id: i64,
    /// The clipboard text.
    pub clip_text: String,
    /// Owning user.
    pub user_id: Uuid,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}
