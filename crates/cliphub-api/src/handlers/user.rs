//! User self-service handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum_extra::extract::cookie::{Cookie, CookieJar};
use tracing::info;

use crate::error::ApiError;
use crate::extractors::CurrentSession;
use crate::state::AppState;

/// DELETE /api/users/me
///
/// Deletes the account: clip and file rows cascade with the user row, the
/// on-disk directory is removed, and every session the user has — on any
/// device — is terminated.
pub async fn delete_account(
    State(state): State<AppState>,
    session: CurrentSession,
    jar: CookieJar,
) -> Result<(StatusCode, CookieJar), ApiError> {
    state.storage.remove_user_dir(session.user_id).await?;
    state.session_manager.delete_account(session.user_id).await?;

    info!(user_id = %session.user_id, "Account deletion complete");

    let removal = Cookie::build((state.config.session.cookie_name.clone(), ""))
        .path("/")
        .build();
    Ok((StatusCode::NO_CONTENT, jar.remove(removal)))
}
