//! Facebook login and cookie sessions.
//!
//! This module provides:
//! - the `OAuthProvider` trait and its Facebook implementation
//! - signed cookie sessions with one-shot flash messages
//! - `require_user` middleware for protecting routes
//! - the `/auth` handlers

pub mod facebook;
mod handlers;
pub mod middleware;
pub mod session;
pub mod types;

pub use facebook::{FacebookAuth, OAuthError, OAuthProvider};
pub use handlers::{auth_callback, auth_login, auth_logout, auth_me};
pub use middleware::{require_user, CurrentUser};
pub use session::Session;
