//! Auth-related types and configuration.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Re-export shared types for convenience
pub use shared_types::{AuthUserResponse, LoginInitResponse};

/// Session cookie claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Logged-in user's local id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<Uuid>,
    /// One-shot error messages shown on the next page
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flashes: Vec<String>,
    /// Issued at timestamp
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
}

/// OAuth access token returned by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken(pub String);

impl AccessToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Profile fields we need from the provider's `/me` endpoint
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FacebookProfile {
    pub id: String,
    pub name: String,
}

/// Auth configuration, derived from [`crate::config::Config`]
#[derive(Clone)]
pub struct AuthConfig {
    pub session_secret: String,
    pub session_duration_days: i64,
    pub cookie_name: String,
    pub secure_cookies: bool,
    pub facebook_app_id: String,
    pub facebook_app_secret: String,
    pub auth_redirect_uri: String,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("session_duration_days", &self.session_duration_days)
            .field("cookie_name", &self.cookie_name)
            .field("secure_cookies", &self.secure_cookies)
            .field("facebook_app_id", &self.facebook_app_id)
            .field("auth_redirect_uri", &self.auth_redirect_uri)
            .finish_non_exhaustive()
    }
}
