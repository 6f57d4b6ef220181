//! Auth handlers — register, login, logout, me.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use validator::Validate;

use cliphub_auth::session::record::Session;
use cliphub_core::error::AppError;
use cliphub_entity::User;

use crate::dto::request::{LoginRequest, RegisterRequest};
use crate::dto::response::{ApiResponse, UserResponse};
use crate::error::ApiError;
use crate::extractors::CurrentSession;
use crate::state::AppState;

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, CookieJar, Json<ApiResponse<UserResponse>>), ApiError> {
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let (user, session) = state
        .session_manager
        .register(&req.username, &req.password, req.remember)
        .await?;

    Ok((
        StatusCode::CREATED,
        jar.add(session_cookie(&state, &session)),
        Json(ApiResponse::ok(user_response(user))),
    ))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<ApiResponse<UserResponse>>), ApiError> {
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let (user, session) = state
        .session_manager
        .login(&req.username, &req.password, req.remember)
        .await?;

    Ok((
        jar.add(session_cookie(&state, &session)),
        Json(ApiResponse::ok(user_response(user))),
    ))
}

/// POST /api/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    session: CurrentSession,
    jar: CookieJar,
) -> (StatusCode, CookieJar) {
    state.session_manager.logout(&session.token);

    let removal = Cookie::build((state.config.session.cookie_name.clone(), ""))
        .path("/")
        .build();
    (StatusCode::NO_CONTENT, jar.remove(removal))
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<AppState>,
    session: CurrentSession,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    let user = state
        .user_repo
        .find_by_id(session.user_id)
        .await?
        .ok_or_else(|| AppError::unauthorized("Account no longer exists"))?;

    Ok(Json(ApiResponse::ok(user_response(user))))
}

/// Builds the session cookie for a freshly minted session.
///
/// Max-age tracks the session's own expiry, so the browser forgets the
/// cookie around the time the server forgets the session.
fn session_cookie(state: &AppState, session: &Session) -> Cookie<'static> {
    let remaining = (session.expires_at - Utc::now()).num_seconds().max(0);

    Cookie::build((
        state.config.session.cookie_name.clone(),
        session.token.expose().to_string(),
    ))
    .path("/")
    .http_only(true)
    .same_site(SameSite::Lax)
    .max_age(time::Duration::seconds(remaining))
    .build()
}

fn user_response(user: User) -> UserResponse {
    UserResponse {
        id: user.id,
        username: user.username,
        created_at: user.created_at,
    }
}
