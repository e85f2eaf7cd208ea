//! Signed cookie sessions.
//!
//! The whole session (current user id plus pending flash messages) is carried
//! in an HS256-signed cookie. Anything that fails to verify is treated as an
//! empty session.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use super::types::{AuthConfig, SessionClaims};

#[derive(Debug, Clone, Default)]
pub struct Session {
    user_id: Option<Uuid>,
    flashes: Vec<String>,
    issued_at: Option<i64>,
    changed: bool,
}

impl Session {
    /// Restore a session from its cookie value; invalid or expired cookies
    /// give an empty session.
    pub fn from_cookie(config: &AuthConfig, value: &str) -> Self {
        match validate_token(config, value) {
            Ok(claims) => Session {
                user_id: claims.uid,
                flashes: claims.flashes,
                issued_at: Some(claims.iat),
                changed: false,
            },
            Err(e) => {
                tracing::debug!("Discarding invalid session cookie: {}", e);
                Session::default()
            }
        }
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.user_id
    }

    pub fn login(&mut self, user_id: Uuid) {
        self.user_id = Some(user_id);
        self.changed = true;
    }

    pub fn logout(&mut self) {
        self.user_id = None;
        self.changed = true;
    }

    pub fn add_flash(&mut self, message: impl Into<String>) {
        self.flashes.push(message.into());
        self.changed = true;
    }

    /// Read and clear pending flash messages.
    pub fn take_flashes(&mut self) -> Vec<String> {
        if !self.flashes.is_empty() {
            self.changed = true;
        }
        std::mem::take(&mut self.flashes)
    }

    /// Whether the cookie has to be written back with the response.
    pub fn is_changed(&self) -> bool {
        self.changed
    }

    /// Sessions older than a day are re-issued so active users stay logged in.
    pub fn should_refresh(&self) -> bool {
        match self.issued_at {
            Some(iat) => Utc::now().timestamp() - iat > 86400,
            None => false,
        }
    }

    /// Serialize to a `Set-Cookie` header value.
    pub fn to_cookie(&self, config: &AuthConfig) -> Result<String, jsonwebtoken::errors::Error> {
        if self.user_id.is_none() && self.flashes.is_empty() {
            return Ok(clear_session_cookie(config));
        }
        let token = create_token(config, self.user_id, self.flashes.clone())?;
        Ok(build_session_cookie(
            &config.cookie_name,
            &token,
            config.session_duration_days,
            config.secure_cookies,
        ))
    }
}

/// Sign a new session token.
pub fn create_token(
    config: &AuthConfig,
    uid: Option<Uuid>,
    flashes: Vec<String>,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let exp = now + Duration::days(config.session_duration_days);

    let claims = SessionClaims {
        uid,
        flashes,
        iat: now.timestamp(),
        exp: exp.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.session_secret.as_bytes()),
    )
}

/// Validate a session token and return its claims.
pub fn validate_token(
    config: &AuthConfig,
    token: &str,
) -> Result<SessionClaims, jsonwebtoken::errors::Error> {
    let token_data = decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(config.session_secret.as_bytes()),
        &Validation::default(),
    )?;

    Ok(token_data.claims)
}

/// Build a session cookie string.
pub fn build_session_cookie(name: &str, value: &str, days: i64, secure: bool) -> String {
    let max_age = days * 24 * 60 * 60;
    let secure = if secure { "; Secure" } else { "" };
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}{}",
        name, value, max_age, secure
    )
}

/// Cookie string that removes the session.
pub fn clear_session_cookie(config: &AuthConfig) -> String {
    format!(
        "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
        config.cookie_name
    )
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn test_config() -> AuthConfig {
        AuthConfig {
            session_secret: "test-secret-key-for-testing-only".to_string(),
            session_duration_days: 30,
            cookie_name: "morning_pages_session".to_string(),
            secure_cookies: false,
            facebook_app_id: "APP_ID".to_string(),
            facebook_app_secret: "APP_SECRET".to_string(),
            auth_redirect_uri: "http://localhost/auth/callback".to_string(),
        }
    }

    fn cookie_value(set_cookie: &str) -> &str {
        let pair = set_cookie.split(';').next().unwrap();
        pair.split_once('=').unwrap().1
    }

    #[test]
    fn test_create_and_validate_token() {
        let config = test_config();
        let user_id = Uuid::new_v4();
        let token = create_token(&config, Some(user_id), vec![]).expect("should create token");

        let claims = validate_token(&config, &token).expect("should validate token");
        assert_eq!(claims.uid, Some(user_id));
        assert!(claims.flashes.is_empty());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let config = test_config();
        let token = create_token(&config, Some(Uuid::new_v4()), vec![]).unwrap();

        let mut wrong_config = config;
        wrong_config.session_secret = "wrong-secret".to_string();

        assert!(validate_token(&wrong_config, &token).is_err());
    }

    #[test]
    fn test_session_round_trip() {
        let config = test_config();
        let user_id = Uuid::new_v4();

        let mut session = Session::default();
        session.login(user_id);
        assert!(session.is_changed());
        let cookie = session.to_cookie(&config).unwrap();
        assert!(cookie.starts_with("morning_pages_session="));
        assert!(cookie.contains("HttpOnly"));
        assert!(!cookie.contains("Secure"));

        let restored = Session::from_cookie(&config, cookie_value(&cookie));
        assert_eq!(restored.user_id(), Some(user_id));
        assert!(!restored.is_changed());
        assert!(!restored.should_refresh());
    }

    #[test]
    fn test_tampered_cookie_gives_empty_session() {
        let config = test_config();
        let session = Session::from_cookie(&config, "garbage.token.value");
        assert_eq!(session.user_id(), None);
    }

    pub(crate) fn sign(config: &AuthConfig, claims: &SessionClaims) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(config.session_secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_expired_cookie_gives_empty_session() {
        let config = test_config();
        let now = Utc::now().timestamp();
        let token = sign(
            &config,
            &SessionClaims {
                uid: Some(Uuid::new_v4()),
                flashes: vec!["stale".to_string()],
                iat: now - 31 * 86400,
                exp: now - 3600,
            },
        );

        let mut session = Session::from_cookie(&config, &token);
        assert_eq!(session.user_id(), None);
        assert!(session.take_flashes().is_empty());
    }

    #[test]
    fn test_day_old_session_should_refresh() {
        let config = test_config();
        let now = Utc::now().timestamp();
        let token = sign(
            &config,
            &SessionClaims {
                uid: Some(Uuid::new_v4()),
                flashes: vec![],
                iat: now - 86400 - 60,
                exp: now + 86400,
            },
        );

        let session = Session::from_cookie(&config, &token);
        assert!(session.user_id().is_some());
        assert!(session.should_refresh());
    }

    #[test]
    fn test_flash_is_consumed_once() {
        let config = test_config();
        let mut session = Session::default();
        session.add_flash("Failed to log in");
        let cookie = session.to_cookie(&config).unwrap();

        let mut restored = Session::from_cookie(&config, cookie_value(&cookie));
        assert_eq!(restored.take_flashes(), vec!["Failed to log in".to_string()]);
        assert!(restored.is_changed());
        assert!(restored.take_flashes().is_empty());

        // Nothing left to carry, so the cookie is cleared
        let cleared = restored.to_cookie(&config).unwrap();
        assert!(cleared.contains("Max-Age=0"));
    }

    #[test]
    fn test_logout_clears_cookie() {
        let config = test_config();
        let mut session = Session::default();
        session.login(Uuid::new_v4());
        session.logout();
        assert_eq!(session.user_id(), None);
        assert_eq!(
            session.to_cookie(&config).unwrap(),
            "morning_pages_session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0"
        );
    }

    #[test]
    fn test_secure_cookie_flag() {
        let cookie = build_session_cookie("s", "v", 1, true);
        assert_eq!(cookie, "s=v; Path=/; HttpOnly; SameSite=Lax; Max-Age=86400; Secure");
    }
}
