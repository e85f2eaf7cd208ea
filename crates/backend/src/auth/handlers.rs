//! Authentication HTTP handlers.

use axum::extract::Query;
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Deserialize;
use shared_types::User;

use crate::error::{ApiError, ApiResult};
use crate::services::find_or_create_user;
use crate::AppState;

use super::{
    middleware::{extract_session, CurrentUser},
    session::Session,
    types::{AuthConfig, AuthUserResponse, LoginInitResponse},
};

const LOGIN_FAILED: &str = "Failed to log in with Facebook";

/// Login page data: the Facebook dialog URL plus any pending error.
///
/// Reading the error consumes it, so the cookie is rewritten when one was shown.
pub async fn auth_login(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Response> {
    let config = &state.auth_config;
    let mut session = extract_session(&headers, config);

    let error = session.take_flashes().into_iter().next();
    let body = Json(LoginInitResponse {
        auth_url: state.provider.dialog_url(),
        error,
    });

    if session.is_changed() {
        let cookie = session_cookie(&session, config)?;
        return Ok(([(header::SET_COOKIE, cookie)], body).into_response());
    }
    Ok(body.into_response())
}

#[derive(Debug, Deserialize)]
pub struct AuthCallbackParams {
    pub code: Option<String>,
    /// Set by Facebook when the user cancels the dialog
    pub error: Option<String>,
}

/// Handle the redirect back from Facebook.
///
/// Exchanges the code for a token, fetches the profile, resolves the local
/// user and logs them in. Anything Facebook refuses is reported on the login
/// page; transport and decoding failures are server errors.
pub async fn auth_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<AuthCallbackParams>,
) -> Response {
    let config = &state.auth_config;
    let mut session = extract_session(&headers, config);

    match handle_callback_inner(&state, params).await {
        Ok(user) => {
            tracing::info!("Successful login for user {}", user.id);
            session.login(user.id);
            redirect_with_session(&session, config, "/")
        }
        Err(ApiError::Unauthorized(reason)) => {
            tracing::warn!("Login failed: {}", reason);
            session.logout();
            session.add_flash(LOGIN_FAILED);
            redirect_with_session(&session, config, "/auth")
        }
        Err(e) => e.into_response(),
    }
}

async fn handle_callback_inner(state: &AppState, params: AuthCallbackParams) -> ApiResult<User> {
    if let Some(error) = params.error {
        return Err(ApiError::Unauthorized(format!("dialog returned {}", error)));
    }
    let code = match params.code {
        Some(code) if !code.is_empty() => code,
        _ => return Err(ApiError::Unauthorized("missing code".to_string())),
    };

    let token = state
        .provider
        .get_access_token(&code)
        .await
        .map_err(rejection_or_error)?;

    let profile = state
        .provider
        .get_user_info(&token)
        .await
        .map_err(rejection_or_error)?;

    tracing::info!("OAuth login attempt from Facebook user {}", profile.id);

    find_or_create_user(state.users.as_ref(), &profile)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create a user: {:?}", e);
            ApiError::Unauthorized("user could not be created".to_string())
        })
}

fn rejection_or_error(err: super::OAuthError) -> ApiError {
    if err.is_rejection() {
        ApiError::Unauthorized(err.to_string())
    } else {
        ApiError::OAuth(err)
    }
}

/// Current authenticated user info.
pub async fn auth_me(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<AuthUserResponse> {
    Json(user.into())
}

/// Logout: drop the user from the session and go back to the login page.
pub async fn auth_logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let config = &state.auth_config;
    let mut session = extract_session(&headers, config);
    session.logout();
    redirect_with_session(&session, config, "/auth")
}

fn session_cookie(session: &Session, config: &AuthConfig) -> ApiResult<String> {
    session
        .to_cookie(config)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("Failed to encode session: {}", e)))
}

fn redirect_with_session(session: &Session, config: &AuthConfig, location: &str) -> Response {
    match session_cookie(session, config) {
        Ok(cookie) => (
            StatusCode::FOUND,
            [
                (header::LOCATION, location.to_string()),
                (header::SET_COOKIE, cookie),
            ],
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}
