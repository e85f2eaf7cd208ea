//! Facebook OAuth client.
//!
//! The [`OAuthProvider`] trait is the seam the handlers depend on; tests swap
//! in a canned provider instead of talking to Facebook.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use super::types::{AccessToken, AuthConfig, FacebookProfile};

#[derive(Debug, Error)]
pub enum OAuthError {
    /// Transport failure talking to the token endpoint
    #[error("Token exchange request failed: {0}")]
    TokenRequest(#[source] reqwest::Error),

    /// Token endpoint answered with a non-200 status
    #[error("Token exchange rejected with status {status}")]
    TokenRejected { status: StatusCode, body: String },

    #[error("Token response could not be parsed: {0}")]
    MalformedTokenResponse(String),

    #[error("Token response is missing `{0}`")]
    MissingField(&'static str),

    /// Transport failure talking to the profile endpoint
    #[error("Profile request failed: {0}")]
    ProfileRequest(#[source] reqwest::Error),

    #[error("Profile request rejected with status {0}")]
    ProfileRejected(StatusCode),

    /// Body was not JSON, or `id` / `name` were absent or not strings
    #[error("Malformed profile response: {0}")]
    MalformedProfile(#[source] serde_json::Error),
}

impl OAuthError {
    /// Whether the provider itself refused the exchange, as opposed to a
    /// transport or decoding failure on our side.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            OAuthError::TokenRejected { .. } | OAuthError::ProfileRejected(_)
        )
    }
}

#[async_trait]
pub trait OAuthProvider: Send + Sync {
    /// Consent dialog the browser is sent to.
    fn dialog_url(&self) -> String;

    /// Token endpoint URL for an authorization code.
    fn access_token_url(&self, code: &str) -> String;

    /// Exchange an authorization code for an access token.
    async fn get_access_token(&self, code: &str) -> Result<AccessToken, OAuthError>;

    /// Fetch the profile of the token's owner.
    async fn get_user_info(&self, token: &AccessToken) -> Result<FacebookProfile, OAuthError>;
}

/// Base URLs of the Graph API endpoints
#[derive(Debug, Clone)]
pub struct FacebookEndpoints {
    pub dialog: String,
    pub access_token: String,
    pub me: String,
}

impl Default for FacebookEndpoints {
    fn default() -> Self {
        Self {
            dialog: "https://www.facebook.com/dialog/oauth".to_string(),
            access_token: "https://graph.facebook.com/oauth/access_token".to_string(),
            me: "https://graph.facebook.com/me".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FacebookAuth {
    app_id: String,
    app_secret: String,
    redirect_url: String,
    endpoints: FacebookEndpoints,
    client: reqwest::Client,
}

impl FacebookAuth {
    pub fn new(
        app_id: impl Into<String>,
        app_secret: impl Into<String>,
        redirect_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            app_id: app_id.into(),
            app_secret: app_secret.into(),
            redirect_url: redirect_url.into(),
            endpoints: FacebookEndpoints::default(),
            client,
        })
    }

    pub fn from_config(config: &AuthConfig, timeout: Duration) -> Result<Self, reqwest::Error> {
        Self::new(
            &config.facebook_app_id,
            &config.facebook_app_secret,
            &config.auth_redirect_uri,
            timeout,
        )
    }

    pub fn with_endpoints(mut self, endpoints: FacebookEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn me_url(&self, token: &AccessToken) -> String {
        format!(
            "{}?access_token={}",
            self.endpoints.me,
            urlencoding::encode(token.as_str())
        )
    }
}

#[async_trait]
impl OAuthProvider for FacebookAuth {
    fn dialog_url(&self) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}",
            self.endpoints.dialog,
            urlencoding::encode(&self.app_id),
            urlencoding::encode(&self.redirect_url)
        )
    }

    fn access_token_url(&self, code: &str) -> String {
        format!(
            "{}?client_id={}&client_secret={}&code={}&redirect_uri={}",
            self.endpoints.access_token,
            urlencoding::encode(&self.app_id),
            urlencoding::encode(&self.app_secret),
            urlencoding::encode(code),
            urlencoding::encode(&self.redirect_url)
        )
    }

    async fn get_access_token(&self, code: &str) -> Result<AccessToken, OAuthError> {
        let response = self
            .client
            .get(self.access_token_url(code))
            .send()
            .await
            .map_err(|e| OAuthError::TokenRequest(e.without_url()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| OAuthError::TokenRequest(e.without_url()))?;

        if status != StatusCode::OK {
            tracing::warn!("Failed to get access token: {} - {}", status, body);
            return Err(OAuthError::TokenRejected { status, body });
        }

        parse_access_token(&body)
    }

    async fn get_user_info(&self, token: &AccessToken) -> Result<FacebookProfile, OAuthError> {
        let response = self
            .client
            .get(self.me_url(token))
            .send()
            .await
            .map_err(|e| OAuthError::ProfileRequest(e.without_url()))?;

        let status = response.status();
        if status != StatusCode::OK {
            tracing::warn!("Failed to get user info: {}", status);
            return Err(OAuthError::ProfileRejected(status));
        }

        let body = response
            .text()
            .await
            .map_err(|e| OAuthError::ProfileRequest(e.without_url()))?;
        serde_json::from_str(&body).map_err(OAuthError::MalformedProfile)
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

/// Parse the token endpoint body. Older Graph API versions answer with a
/// URL-encoded form, newer ones with a JSON object.
fn parse_access_token(body: &str) -> Result<AccessToken, OAuthError> {
    let body = body.trim();

    let parsed: TokenResponse = if body.starts_with('{') {
        serde_json::from_str(body).map_err(|e| OAuthError::MalformedTokenResponse(e.to_string()))?
    } else {
        serde_urlencoded::from_str(body)
            .map_err(|e| OAuthError::MalformedTokenResponse(e.to_string()))?
    };

    match parsed.access_token {
        Some(token) if !token.is_empty() => Ok(AccessToken(token)),
        _ => Err(OAuthError::MissingField("access_token")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode as AxumStatus, routing::get, Router};

    fn facebook() -> FacebookAuth {
        FacebookAuth::new(
            "APP_ID",
            "APP_SECRET",
            "http://somewhere.org/something",
            Duration::from_secs(5),
        )
        .unwrap()
    }

    /// Serve `router` on an ephemeral local port and return its base URL.
    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn pointed_at(base: &str) -> FacebookAuth {
        facebook().with_endpoints(FacebookEndpoints {
            dialog: format!("{}/dialog", base),
            access_token: format!("{}/token", base),
            me: format!("{}/me", base),
        })
    }

    #[test]
    fn test_dialog_url() {
        assert_eq!(
            facebook().dialog_url(),
            "https://www.facebook.com/dialog/oauth?client_id=APP_ID&redirect_uri=http%3A%2F%2Fsomewhere.org%2Fsomething"
        );
    }

    #[test]
    fn test_access_token_url() {
        assert_eq!(
            facebook().access_token_url("SOME_CODE"),
            "https://graph.facebook.com/oauth/access_token?client_id=APP_ID&client_secret=APP_SECRET&code=SOME_CODE&redirect_uri=http%3A%2F%2Fsomewhere.org%2Fsomething"
        );
    }

    #[test]
    fn test_me_url() {
        let token = AccessToken("SOME_TOKEN".to_string());
        assert_eq!(
            facebook().me_url(&token),
            "https://graph.facebook.com/me?access_token=SOME_TOKEN"
        );
    }

    #[test]
    fn test_parse_access_token_form() {
        let token = parse_access_token("access_token=HELLO&expires=5183999\n").unwrap();
        assert_eq!(token.as_str(), "HELLO");
    }

    #[test]
    fn test_parse_access_token_json() {
        let token =
            parse_access_token(r#"{"access_token":"HELLO","token_type":"bearer"}"#).unwrap();
        assert_eq!(token.as_str(), "HELLO");
    }

    #[test]
    fn test_parse_access_token_missing() {
        assert!(matches!(
            parse_access_token("expires=5183999"),
            Err(OAuthError::MissingField("access_token"))
        ));
        assert!(matches!(
            parse_access_token("access_token="),
            Err(OAuthError::MissingField("access_token"))
        ));
    }

    #[tokio::test]
    async fn test_get_access_token_ok() {
        let base = serve(Router::new().route("/token", get(|| async { "access_token=HELLO\n" }))).await;

        let token = pointed_at(&base).get_access_token("CODE").await.unwrap();
        assert_eq!(token, AccessToken("HELLO".to_string()));
    }

    #[tokio::test]
    async fn test_get_access_token_rejected() {
        let base = serve(Router::new().route(
            "/token",
            get(|| async { (AxumStatus::BAD_REQUEST, "Error!\n") }),
        ))
        .await;

        let err = pointed_at(&base).get_access_token("CODE").await.unwrap_err();
        assert!(err.is_rejection());
        assert!(matches!(err, OAuthError::TokenRejected { status, .. } if status == StatusCode::BAD_REQUEST));
    }

    #[tokio::test]
    async fn test_get_access_token_unreachable() {
        let err = pointed_at("http://127.0.0.1:1")
            .get_access_token("CODE")
            .await
            .unwrap_err();
        assert!(matches!(err, OAuthError::TokenRequest(_)));
        assert!(!err.is_rejection());

        // The token URL carries the app secret and the code
        let logged = format!("{} {:?}", err, err);
        assert!(!logged.contains("APP_SECRET"), "{}", logged);
        assert!(!logged.contains("CODE"), "{}", logged);
    }

    #[tokio::test]
    async fn test_get_user_info_ok() {
        let base = serve(Router::new().route(
            "/me",
            get(|| async { r#"{"id": "1234567890", "name": "Hello World"}"# }),
        ))
        .await;

        let token = AccessToken("TOKEN".to_string());
        let profile = pointed_at(&base).get_user_info(&token).await.unwrap();
        assert_eq!(profile.id, "1234567890");
        assert_eq!(profile.name, "Hello World");
    }

    #[tokio::test]
    async fn test_get_user_info_rejected() {
        let base = serve(Router::new().route(
            "/me",
            get(|| async { (AxumStatus::BAD_REQUEST, "Error!\n") }),
        ))
        .await;

        let token = AccessToken("TOKEN".to_string());
        let err = pointed_at(&base).get_user_info(&token).await.unwrap_err();
        assert!(matches!(err, OAuthError::ProfileRejected(_)));
    }

    #[tokio::test]
    async fn test_get_user_info_malformed() {
        let base = serve(
            Router::new()
                .route("/me", get(|| async { "not json" }))
                .route("/numeric/me", get(|| async { r#"{"id": 123, "name": "Ann"}"# })),
        )
        .await;

        let token = AccessToken("TOKEN".to_string());
        let err = pointed_at(&base).get_user_info(&token).await.unwrap_err();
        assert!(matches!(err, OAuthError::MalformedProfile(_)));

        let numeric_id = facebook().with_endpoints(FacebookEndpoints {
            dialog: String::new(),
            access_token: String::new(),
            me: format!("{}/numeric/me", base),
        });
        let err = numeric_id.get_user_info(&token).await.unwrap_err();
        assert!(matches!(err, OAuthError::MalformedProfile(_)));
    }

    #[tokio::test]
    async fn test_get_user_info_unreachable() {
        let token = AccessToken("TOKEN".to_string());
        let err = pointed_at("http://127.0.0.1:1")
            .get_user_info(&token)
            .await
            .unwrap_err();
        assert!(matches!(err, OAuthError::ProfileRequest(_)));

        let logged = format!("{} {:?}", err, err);
        assert!(!logged.contains("TOKEN"), "{}", logged);
    }
}
