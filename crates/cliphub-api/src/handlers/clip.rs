//! Clipboard handlers.
//!
//! Every mutation publishes to the clipboard broker so the user's other
//! devices refresh their view.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum_extra::extract::Query;
use validator::Validate;

use cliphub_core::error::AppError;
use cliphub_entity::Clip;

use crate::dto::request::{CreateClipRequest, IdsQuery};
use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::extractors::CurrentSession;
use crate::state::AppState;

/// GET /api/clips
pub async fn list_clips(
    State(state): State<AppState>,
    session: CurrentSession,
) -> Result<Json<ApiResponse<Vec<Clip>>>, ApiError> {
    let clips = state.clip_repo.list_for_user(session.user_id).await?;
    Ok(Json(ApiResponse::ok(clips)))
}

/// POST /api/clips
pub async fn create_clip(
    State(state): State<AppState>,
    session: CurrentSession,
    Json(req): Json<CreateClipRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Clip>>), ApiError> {
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let clip = state
        .clip_repo
        .insert(session.user_id, &req.text)
        .await?;
    state.clip_broker.publish(session.user_id, 1);

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(clip))))
}

/// DELETE /api/clips?id=…&id=…
pub async fn delete_clips(
    State(state): State<AppState>,
    session: CurrentSession,
    Query(query): Query<IdsQuery>,
) -> Result<StatusCode, ApiError> {
    if query.id.is_empty() {
        return Err(AppError::validation("No clip ids given").into());
    }

    let removed = state
        .clip_repo
        .delete_many(session.user_id, &query.id)
        .await?;
    if removed > 0 {
        state.clip_broker.publish(session.user_id, 1);
    }

    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/clips/all
pub async fn delete_all_clips(
    State(state): State<AppState>,
    session: CurrentSession,
) -> Result<StatusCode, ApiError> {
    let removed = state.clip_repo.delete_all(session.user_id).await?;
    if removed > 0 {
        state.clip_broker.publish(session.user_id, 1);
    }

    Ok(StatusCode::NO_CONTENT)
}
