use std::sync::Arc;

use anyhow::Context;
use axum::http::{header, Method};
use clap::Parser;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::{ServeDir, ServeFile},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use morning_pages::{
    auth::FacebookAuth,
    build_router,
    config::Config,
    db,
    repository::{EntryStore, MemoryStore, PgStore, UserStore},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "morning_pages=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();
    let config = Config::parse();

    let timezone = config.timezone()?;
    tracing::info!("Using timezone {}", timezone);

    let (users, entries): (Arc<dyn UserStore>, Arc<dyn EntryStore>) = match &config.database_url {
        Some(url) => {
            let pool = db::establish_connection_pool(url, config.database_tls)?;
            tracing::info!("Database connection pool initialized");
            let store = Arc::new(PgStore::new(pool));
            (store.clone(), store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, entries are kept in memory and lost on restart");
            let store = Arc::new(MemoryStore::new());
            (store.clone(), store)
        }
    };

    let auth_config = config.auth_config();
    let provider = FacebookAuth::from_config(&auth_config, config.oauth_timeout())
        .context("Failed to build HTTP client")?;

    let state = AppState {
        auth_config: Arc::new(auth_config),
        timezone,
        users,
        entries,
        provider: Arc::new(provider),
    };

    let app = build_router(state).layer(build_cors_layer(config.cors_allowed_origins.as_deref()));

    // Serve static frontend files if the directory exists
    let frontend_dir = &config.frontend_dir;
    let app = if std::path::Path::new(frontend_dir).exists() {
        tracing::info!("Serving frontend from {}", frontend_dir);
        let index_path = format!("{}/index.html", frontend_dir);
        let serve_dir = ServeDir::new(frontend_dir).not_found_service(ServeFile::new(&index_path));
        app.fallback_service(serve_dir)
    } else {
        tracing::info!(
            "Frontend directory not found at {}, serving API only",
            frontend_dir
        );
        app
    };

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Build CORS layer from the configured origin list.
///
/// Without an explicit list, defaults to permissive CORS (for development only).
fn build_cors_layer(allowed_origins: Option<&str>) -> CorsLayer {
    match allowed_origins {
        Some(origins) => {
            let origins: Vec<_> = origins
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();

            if origins.is_empty() {
                tracing::warn!(
                    "CORS_ALLOWED_ORIGINS is set but empty, using permissive CORS (not recommended for production)"
                );
                CorsLayer::permissive()
            } else {
                tracing::info!("CORS configured for origins: {:?}", origins);
                CorsLayer::new()
                    .allow_origin(AllowOrigin::list(origins))
                    .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                    .allow_headers([header::CONTENT_TYPE])
                    .allow_credentials(true)
            }
        }
        None => {
            tracing::warn!(
                "CORS_ALLOWED_ORIGINS not set, using permissive CORS (not recommended for production)"
            );
            CorsLayer::permissive()
        }
    }
}
