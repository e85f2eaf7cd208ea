//! Server configuration, read from command-line flags or the environment.

use std::time::Duration;

use chrono_tz::Tz;
use clap::Parser;

use crate::auth::types::AuthConfig;
use crate::dates::{load_timezone, DateError};

pub const SESSION_COOKIE_NAME: &str = "morning_pages_session";

#[derive(Debug, Clone, Parser)]
#[command(name = "morning-pages")]
#[command(about = "Daily private journal backed by Facebook login")]
pub struct Config {
    /// PostgreSQL connection string. Entries are kept in memory when unset.
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Connect to PostgreSQL over TLS.
    #[arg(long, env = "DATABASE_TLS")]
    pub database_tls: bool,

    #[arg(long, env = "FB_APP_ID")]
    pub fb_app_id: String,

    #[arg(long, env = "FB_APP_SECRET", hide_env_values = true)]
    pub fb_app_secret: String,

    /// Where Facebook sends the user back, e.g. http://localhost:3000/auth/callback
    #[arg(long, env = "FB_REDIRECT_URL")]
    pub fb_redirect_url: String,

    /// Secret used to sign session cookies.
    #[arg(long, env = "SESSION_KEY", hide_env_values = true)]
    pub session_key: String,

    /// IANA timezone that decides which day is "today".
    #[arg(long, env = "TIMEZONE", default_value = "Asia/Tokyo")]
    pub timezone: String,

    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Session cookie lifetime in days (1 to 3650).
    #[arg(
        long,
        env = "SESSION_DAYS",
        default_value_t = 30,
        value_parser = clap::value_parser!(i64).range(1..=3650)
    )]
    pub session_days: i64,

    /// Timeout for calls to Facebook, in seconds.
    #[arg(long, env = "OAUTH_TIMEOUT_SECS", default_value_t = 10)]
    pub oauth_timeout_secs: u64,

    /// "production" turns on Secure cookies.
    #[arg(long, env = "RUST_ENV", default_value = "development")]
    pub rust_env: String,

    /// Comma-separated list of allowed CORS origins.
    #[arg(long, env = "CORS_ALLOWED_ORIGINS")]
    pub cors_allowed_origins: Option<String>,

    /// Static frontend served for unmatched paths, when present.
    #[arg(long, env = "FRONTEND_DIR", default_value = "frontend/dist")]
    pub frontend_dir: String,
}

impl Config {
    pub fn is_production(&self) -> bool {
        self.rust_env == "production"
    }

    pub fn auth_config(&self) -> AuthConfig {
        AuthConfig {
            session_secret: self.session_key.clone(),
            session_duration_days: self.session_days,
            cookie_name: SESSION_COOKIE_NAME.to_string(),
            secure_cookies: self.is_production(),
            facebook_app_id: self.fb_app_id.clone(),
            facebook_app_secret: self.fb_app_secret.clone(),
            auth_redirect_uri: self.fb_redirect_url.clone(),
        }
    }

    pub fn timezone(&self) -> Result<Tz, DateError> {
        load_timezone(&self.timezone)
    }

    pub fn oauth_timeout(&self) -> Duration {
        Duration::from_secs(self.oauth_timeout_secs)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
