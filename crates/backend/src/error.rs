//! Unified error handling for the HTTP layer.
//!
//! Handlers return [`ApiResult`] and use `?` freely. Store, transport and
//! decoding failures are logged in full but answered with a generic message.
//! Validation failures carry their message to the client.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::auth::OAuthError;
use crate::dates::DateError;
use crate::services::EntryError;

/// API error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Unified error type for API handlers
#[derive(Debug, Error)]
pub enum ApiError {
    /// Store or other internal failure
    #[error("{0}")]
    Internal(#[from] anyhow::Error),

    /// Token exchange or profile fetch failure
    #[error("OAuth error: {0}")]
    OAuth(#[from] OAuthError),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// No valid session; the client is sent to the login page
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}

impl From<DateError> for ApiError {
    fn from(err: DateError) -> Self {
        match err {
            DateError::InvalidFormat(_) => {
                ApiError::BadRequest("Invalid date. e.g. 2014-01-02".to_string())
            }
            // timezones are resolved at startup
            err @ DateError::UnknownTimezone(_) => ApiError::Internal(err.into()),
        }
    }
}

impl From<EntryError> for ApiError {
    fn from(err: EntryError) -> Self {
        match err {
            EntryError::NotEditable => ApiError::BadRequest(EntryError::NotEditable.to_string()),
            EntryError::Store(e) => ApiError::Internal(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            ApiError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            ApiError::OAuth(e) => {
                tracing::error!("OAuth error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to communicate with Facebook".to_string(),
                )
            }
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Unauthorized(msg) => {
                tracing::info!("Unauthorized: {}", msg);
                return (StatusCode::FOUND, [(header::LOCATION, "/auth")]).into_response();
            }
        };

        let body = Json(ErrorResponse {
            error: error_message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_bad_request_carries_message() {
        let response = ApiError::from(EntryError::NotEditable).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await["error"],
            "Past entries are not editable"
        );
    }

    #[tokio::test]
    async fn test_internal_error_hides_detail() {
        let err = ApiError::from(anyhow::anyhow!("connection refused at 10.0.0.3:5432"));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Internal server error");
        assert!(!body.to_string().contains("10.0.0.3"));
    }

    #[tokio::test]
    async fn test_invalid_date_is_bad_request() {
        let err: ApiError = DateError::InvalidFormat("2013-1-1".to_string()).into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await["error"],
            "Invalid date. e.g. 2014-01-02"
        );
    }

    #[tokio::test]
    async fn test_unknown_timezone_is_internal() {
        let err: ApiError = DateError::UnknownTimezone("Mars/Olympus".to_string()).into();
        assert!(matches!(err, ApiError::Internal(_)));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["error"], "Internal server error");
    }

    #[test]
    fn test_unauthorized_redirects_to_login() {
        let response = ApiError::Unauthorized("no session".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/auth");
    }
}
