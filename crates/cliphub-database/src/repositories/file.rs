//! Stored-file repository implementation.

use sqlx::PgPool;
use uuid::Uuid;

use cliphub_core::error::{AppError, ErrorKind};
use cliphub_core::result::AppResult;
use cliphub_entity::StoredFile;

/// Repository for file metadata rows.
#[derive(Debug, Clone)]
pub struct FileRepository {
    pool: PgPool,
}

impl FileRepository {
    /// Create a new file repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a metadata row for an upload; the returned id names the
    /// file on disk.
    pub async fn insert(&self, user_id: Uuid, file_name: &str) -> AppResult<StoredFile> {
        sqlx::query_as::<_, StoredFile>(
            "INSERT INTO files (file_name, user_id) VALUES ($1, $2) RETURNING *",
        )
        .bind(file_name)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to insert file record", e))
    }

    /// List a user's file records, newest first.
    pub async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<StoredFile>> {
        sqlx::query_as::<_, StoredFile>(
            "SELECT * FROM files WHERE user_id = $1 ORDER BY id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list files", e))
    }

    /// Look up one of the user's files by id.
    pub async fn find_for_user(&self, user_id: Uuid, id: i64) -> AppResult<Option<StoredFile>> {
        sqlx::query_as::<_, StoredFile>("SELECT * FROM files WHERE user_id = $1 AND id = $2")
            .bind(user_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find file", e))
    }

    /// Delete specific file rows owned by the user, returning the removed
    /// records so their on-disk blobs can be cleaned up.
    pub async fn delete_many(&self, user_id: Uuid, ids: &[i64]) -> AppResult<Vec<StoredFile>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_as::<_, StoredFile>(
            "DELETE FROM files WHERE user_id = $1 AND id = ANY($2) RETURNING *",
        )
        .bind(user_id)
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete files", e))
    }
}
