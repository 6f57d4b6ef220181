//! Stored file record model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Metadata row for a file stored on disk.
///
/// The file's on-disk path is `{storage.root}/{user_id}/{id}`; only the
/// original name lives in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct StoredFile {
    /// Record identifier; also the on-disk file name.
    pub id: i64,
    /// Original upload file name, used for Content-Disposition.
    pub file_name: String,
    /// Owning user.
    pub user_id: Uuid,
    /// Upload time.
    pub created_at: DateTime<Utc>,
}
