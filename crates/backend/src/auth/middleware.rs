//! Authentication middleware layer for protecting routes.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use shared_types::User;

use crate::error::ApiError;
use crate::AppState;

use super::session::{clear_session_cookie, Session};
use super::types::AuthConfig;

/// The logged-in user, inserted into request extensions by [`require_user`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Middleware that resolves the session's user or redirects to the login page.
///
/// Used with `axum::middleware::from_fn_with_state`. A session pointing at an
/// unknown user is cleared along with the redirect.
pub async fn require_user(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let config = &state.auth_config;
    let session = extract_session(request.headers(), config);

    let Some(user_id) = session.user_id() else {
        tracing::info!("Unauthorized access to {}", request.uri().path());
        return unauthorized(config);
    };

    let user = match state.users.get(user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            tracing::warn!("User not found for session: {}", user_id);
            return unauthorized(config);
        }
        Err(e) => return ApiError::Internal(e).into_response(),
    };

    request.extensions_mut().insert(CurrentUser(user));
    let response = next.run(request).await;

    // Slide the expiry forward unless the handler already rewrote the cookie
    if session.should_refresh() && !response.headers().contains_key(header::SET_COOKIE) {
        if let Ok(cookie) = session.to_cookie(config) {
            let (mut parts, body) = response.into_parts();
            if let Ok(cookie_value) = cookie.parse() {
                parts.headers.insert(header::SET_COOKIE, cookie_value);
            }
            return Response::from_parts(parts, body);
        }
    }

    response
}

fn unauthorized(config: &AuthConfig) -> Response {
    (
        StatusCode::FOUND,
        [
            (header::LOCATION, "/auth".to_string()),
            (header::SET_COOKIE, clear_session_cookie(config)),
        ],
    )
        .into_response()
}

fn extract_cookie(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;

    for cookie_str in cookie_header.split(';') {
        if let Ok(cookie) = cookie::Cookie::parse(cookie_str.trim()) {
            if cookie.name() == cookie_name {
                return Some(cookie.value().to_string());
            }
        }
    }

    None
}

/// Read the session from request headers. Missing or invalid cookies give
/// an empty session.
pub fn extract_session(headers: &HeaderMap, config: &AuthConfig) -> Session {
    match extract_cookie(headers, &config.cookie_name) {
        Some(value) => Session::from_cookie(config, &value),
        None => Session::default(),
    }
}
