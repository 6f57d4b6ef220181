//! Clipboard repository implementation.

use sqlx::PgPool;
use uuid::Uuid;

use cliphub_core::error::{AppError, ErrorKind};
use cliphub_core::result::AppResult;
use cliphub_entity::Clip;

/// Repository for clipboard entries.
#[derive(Debug, Clone)]
pub struct ClipRepository {
    pool: PgPool,
}

impl ClipRepository {
    /// Create a new clip repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List a user's clips, newest first.
    pub async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<Clip>> {
        sqlx::query_as::<_, Clip>(
            "SELECT * FROM clips WHERE user_id = $1 ORDER BY id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list clips", e))
    }

    /// Insert a new clip for a user.
    pub async fn insert(&self, user_id: Uuid, text: &str) -> AppResult<Clip> {
        sqlx::query_as::<_, Clip>(
            "INSERT INTO clips (clip_text, user_id) VALUES ($1, $2) RETURNING *",
        )
        .bind(text)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to insert clip", e))
    }

    /// Delete specific clips owned by the user. Returns rows removed.
    pub async fn delete_many(&self, user_id: Uuid, ids: &[i64]) -> AppResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query("DELETE FROM clips WHERE user_id = $1 AND id = ANY($2)")
            .bind(user_id)
            .bind(ids)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete clips", e))?;

        Ok(result.rows_affected())
    }

    /// Delete every clip owned by the user. Returns rows removed.
    pub async fn delete_all(&self, user_id: Uuid) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM clips WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete all clips", e)
            })?;

        Ok(result.rows_affected())
    }
}
