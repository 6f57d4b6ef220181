//! File handlers — list, multipart upload, streamed download, delete.

use axum::Json;
use axum::body::Body;
use axum::extract::{Multipart, Path, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum_extra::extract::Query;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::info;

use cliphub_core::error::AppError;
use cliphub_entity::StoredFile;

use crate::dto::request::IdsQuery;
use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::extractors::CurrentSession;
use crate::state::AppState;

/// GET /api/files
pub async fn list_files(
    State(state): State<AppState>,
    session: CurrentSession,
) -> Result<Json<ApiResponse<Vec<StoredFile>>>, ApiError> {
    let files = state.file_repo.list_for_user(session.user_id).await?;
    Ok(Json(ApiResponse::ok(files)))
}

/// POST /api/files
///
/// Accepts any number of file parts in one multipart body. Each part gets
/// a metadata row first, then its bytes are streamed to
/// `{root}/{user_id}/{row id}`. One notice is published for the whole
/// batch.
pub async fn upload_files(
    State(state): State<AppState>,
    session: CurrentSession,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<Vec<StoredFile>>>), ApiError> {
    let mut stored = Vec::new();

    while let Some(mut field) = multipart.next_field().await.map_err(bad_multipart)? {
        // Parts without a file name are form fields, not uploads.
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };

        let record = state.file_repo.insert(session.user_id, &file_name).await?;
        let mut file = state.storage.create_file(session.user_id, record.id).await?;

        let mut written: u64 = 0;
        while let Some(chunk) = field.chunk().await.map_err(bad_multipart)? {
            written += chunk.len() as u64;
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        info!(
            user_id = %session.user_id,
            file_id = record.id,
            file_name = %record.file_name,
            bytes = written,
            "File uploaded"
        );
        stored.push(record);
    }

    if stored.is_empty() {
        return Err(AppError::validation("No file parts in upload").into());
    }
    state.file_broker.publish(session.user_id, 1);

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(stored))))
}

/// GET /api/files/{id}/download
pub async fn download_file(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let record = state
        .file_repo
        .find_for_user(session.user_id, id)
        .await?
        .ok_or_else(|| AppError::not_found("File not found"))?;

    let file = state.storage.open_file(session.user_id, record.id).await?;
    let body = Body::from_stream(ReaderStream::new(file));

    let disposition = format!(
        "attachment; filename=\"{}\"",
        record.file_name.replace(['"', '\\'], "_")
    );

    Ok((
        [
            (
                header::CONTENT_TYPE,
                "application/octet-stream".to_string(),
            ),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}

/// DELETE /api/files?id=…&id=…
pub async fn delete_files(
    State(state): State<AppState>,
    session: CurrentSession,
    Query(query): Query<IdsQuery>,
) -> Result<StatusCode, ApiError> {
    if query.id.is_empty() {
        return Err(AppError::validation("No file ids given").into());
    }

    let removed = state
        .file_repo
        .delete_many(session.user_id, &query.id)
        .await?;

    for record in &removed {
        state.storage.remove_file(session.user_id, record.id).await?;
    }
    if !removed.is_empty() {
        state.file_broker.publish(session.user_id, 1);
    }

    Ok(StatusCode::NO_CONTENT)
}

fn bad_multipart(e: axum::extract::multipart::MultipartError) -> AppError {
    AppError::validation(format!("Malformed multipart body: {e}"))
}
