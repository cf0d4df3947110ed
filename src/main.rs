//! Loanbook Backend Server
//!
//! Serves the loan management API backed by PostgreSQL.

use std::sync::Arc;

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};

use loanbook_server::auth::AuthService;
use loanbook_server::config::Config;
use loanbook_server::db;
use loanbook_server::routes;
use loanbook_server::state::AppState;
use loanbook_server::store::{PgStore, SharedStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!(environment = config.environment.as_str(), "Starting Loanbook server");

    let pool = db::create_pool(&config).await?;
    db::run_migrations(&pool).await?;

    let store: SharedStore = Arc::new(PgStore::new(pool));
    let auth_service = AuthService::new(
        store.clone(),
        config.jwt_secret.clone(),
        config.jwt_ttl_seconds,
        config.bcrypt_cost,
    );

    match config.admin_seed() {
        Some(seed) => {
            auth_service
                .ensure_admin(&seed)
                .await
                .context("Failed to seed admin account")?;
        }
        None => tracing::warn!("ADMIN_PASSWORD not set, skipping admin account seeding"),
    }

    let app_state = AppState::new(store, auth_service);
    let app = routes::app(app_state).layer(configure_cors(&config));

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check at http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

fn configure_cors(config: &Config) -> CorsLayer {
    let Some(allowed) = config.cors_allowed_origins.as_deref() else {
        tracing::warn!("CORS_ALLOWED_ORIGINS not set, allowing all origins (permissive)");
        return CorsLayer::permissive();
    };

    let origins: Vec<HeaderValue> = allowed
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers(Any)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
