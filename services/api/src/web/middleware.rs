//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use duotrack_core::domain::Identity;
use std::sync::Arc;
use tracing::warn;

use crate::web::response::HttpError;
use crate::web::state::AppState;

/// Finds the opaque auth session id in the `session` cookie or a bearer token.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let from_cookie = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .find_map(|c| c.trim().strip_prefix("session="))
        .filter(|id| !id.is_empty())
        .map(str::to_string);

    from_cookie.or_else(|| {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::to_string)
    })
}

/// Middleware that validates the auth session and resolves the caller's identity.
///
/// If valid, inserts an `Identity` into request extensions for handlers to use.
/// If invalid or missing, returns 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, HttpError> {
    // 1. Extract the session id
    let auth_session_id = session_token(req.headers())
        .ok_or_else(|| HttpError::unauthorized("Not authenticated"))?;

    // 2. Validate it against the store
    let user_id = state
        .db
        .validate_auth_session(&auth_session_id, state.now())
        .await
        .map_err(|e| {
            warn!("Rejected auth session: {:?}", e);
            HttpError::unauthorized("Session expired or invalid")
        })?;

    // 3. Resolve the identity claim
    let user = state.db.get_user(user_id).await.map_err(|e| {
        warn!("Auth session points at a missing user {}: {:?}", user_id, e);
        HttpError::unauthorized("Session expired or invalid")
    })?;
    req.extensions_mut().insert(Identity {
        user_id: user.id,
        is_admin: user.is_admin,
    });

    // 4. Continue to the handler
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn token_comes_from_cookie_or_bearer_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(session_token(&headers).as_deref(), Some("abc"));

        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; session=xyz"));
        assert_eq!(session_token(&headers).as_deref(), Some("xyz"));
    }
}
