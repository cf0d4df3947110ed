//! PostgreSQL pool setup and embedded migrations

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

use crate::config::Config;

const CONNECT_ATTEMPTS: u32 = 5;

/// Database connection error
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Failed to connect to database: {0}")]
    ConnectionError(String),

    #[error("Failed to run migrations: {0}")]
    MigrationError(String),
}

/// Create a database connection pool.
///
/// The database often comes up alongside the server, so connection failures
/// are retried a few times with a growing delay before giving up.
pub async fn create_pool(config: &Config) -> Result<PgPool, DbError> {
    tracing::info!(
        url = %config.database_url_masked(),
        max_connections = config.db_max_connections,
        "Connecting to database"
    );

    let options = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(600));

    let mut attempt = 1;
    loop {
        match options.clone().connect(&config.database_url).await {
            Ok(pool) => {
                tracing::info!(attempt, "Database connection pool created");
                return Ok(pool);
            }
            Err(e) if attempt < CONNECT_ATTEMPTS => {
                let delay = Duration::from_secs(u64::from(attempt));
                tracing::warn!(
                    attempt,
                    error = %e,
                    retry_in_secs = delay.as_secs(),
                    "Database not reachable yet"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(DbError::ConnectionError(e.to_string())),
        }
    }
}

/// Apply pending migrations from `./migrations`
pub async fn run_migrations(pool: &PgPool) -> Result<(), DbError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| DbError::MigrationError(e.to_string()))?;

    tracing::info!("Database migrations applied");
    Ok(())
}
