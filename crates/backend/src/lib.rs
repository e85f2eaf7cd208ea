//! Morning pages: a private daily journal behind Facebook login.
//!
//! One entry per user per calendar day; only today's entry can be written.

use std::sync::Arc;

use axum::{middleware, routing::get, Router};
use chrono_tz::Tz;
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod config;
pub mod dates;
pub mod db;
pub mod error;
pub mod handlers;
mod models;
pub mod repository;
mod schema;
pub mod services;

use auth::types::AuthConfig;
use auth::OAuthProvider;
use repository::{EntryStore, UserStore};

/// Shared handler state. Everything a handler touches is injected here.
#[derive(Clone)]
pub struct AppState {
    pub auth_config: Arc<AuthConfig>,
    /// Zone that decides which day is "today"
    pub timezone: Tz,
    pub users: Arc<dyn UserStore>,
    pub entries: Arc<dyn EntryStore>,
    pub provider: Arc<dyn OAuthProvider>,
}

/// All application routes. Entry pages and `/auth/me` require a logged-in user.
pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/", get(handlers::root))
        .route("/auth/me", get(auth::auth_me))
        .route(
            "/entries/:date",
            get(handlers::show_entry).post(handlers::save_entry),
        )
        .route("/entries/:date/edit", get(handlers::edit_entry))
        .route("/entries/:date/calendar", get(handlers::show_calendar))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_user,
        ));

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/auth", get(auth::auth_login))
        .route("/auth/logout", get(auth::auth_logout))
        .route("/auth/callback", get(auth::auth_callback))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
