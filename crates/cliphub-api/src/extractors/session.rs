//! `CurrentSession` extractor — pulls the session cookie, validates it
//! against the store, and slides the expiry forward.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::cookie::CookieJar;

use cliphub_auth::session::record::Session;
use cliphub_core::error::AppError;
use cliphub_core::types::id::SessionToken;

use crate::error::ApiError;
use crate::state::AppState;

/// The authenticated session for the current request.
///
/// Extraction revitalizes the session, so any authenticated call keeps
/// the sliding window open. Missing, unknown, or expired tokens reject
/// with 401; the client routes back to login.
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Session);

impl std::ops::Deref for CurrentSession {
    type Target = Session;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let cookie = jar
            .get(&state.config.session.cookie_name)
            .ok_or_else(|| AppError::unauthorized("Not logged in"))?;

        let token = SessionToken::from(cookie.value());
        let session = state
            .session_store
            .revitalize(&token)
            .ok_or_else(|| AppError::unauthorized("Session expired"))?;

        Ok(CurrentSession(session))
    }
}
