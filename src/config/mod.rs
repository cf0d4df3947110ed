//! Configuration management for Loanbook
//!
//! Loads and validates configuration from environment variables, with
//! stricter rules for production deployments.

use std::env;
use thiserror::Error;

use crate::auth::AdminSeed;

const DEV_JWT_SECRET: &str = "development-secret-change-in-production";
const DEV_ADMIN_PASSWORD: &str = "admin123";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid environment value: {0}")]
    InvalidValue(String),

    #[error("Invalid port number: {0}")]
    InvalidPort(String),
}

/// Application environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    /// Parse environment from string
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Ok(Environment::Development),
            "staging" => Ok(Environment::Staging),
            "prod" | "production" => Ok(Environment::Production),
            _ => Err(ConfigError::InvalidValue(format!(
                "Invalid environment: '{}'. Expected: dev, staging, or prod",
                s
            ))),
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,

    /// Current environment
    pub environment: Environment,

    /// Bind address
    pub host: String,

    /// Server port
    pub port: u16,

    /// Maximum database connections
    pub db_max_connections: u32,

    /// Comma-separated CORS origins; any origin when unset
    pub cors_allowed_origins: Option<String>,

    /// Log level (RUST_LOG)
    pub log_level: String,

    /// JWT secret for token signing
    pub jwt_secret: String,

    /// Access token lifetime in seconds (default: 86400 = 24 hours)
    pub jwt_ttl_seconds: i64,

    /// bcrypt work factor
    pub bcrypt_cost: u32,

    pub admin_username: String,
    pub admin_email: String,
    /// `None` disables admin seeding
    pub admin_password: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("ENVIRONMENT")
            .map(|s| Environment::parse(&s))
            .unwrap_or(Ok(Environment::Development))?;

        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("DATABASE_URL".to_string()))?;

        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());

        let port = lookup("PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort("PORT must be a valid number".to_string()))?;

        let db_max_connections = parse_or(&lookup, "DB_MAX_CONNECTIONS", 5u32);

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS").filter(|s| !s.trim().is_empty());

        let log_level = lookup("RUST_LOG").unwrap_or_else(|| "info".to_string());

        let jwt_secret = match lookup("JWT_SECRET") {
            Some(secret) => secret,
            None if environment.is_production() => {
                return Err(ConfigError::MissingEnvVar("JWT_SECRET".to_string()))
            }
            None => DEV_JWT_SECRET.to_string(),
        };

        let jwt_ttl_seconds = parse_or(&lookup, "JWT_TTL_SECONDS", 86_400i64);

        let bcrypt_cost = parse_or(&lookup, "BCRYPT_COST", bcrypt::DEFAULT_COST);
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(ConfigError::InvalidValue(format!(
                "BCRYPT_COST must be between 4 and 31, got {}",
                bcrypt_cost
            )));
        }

        let admin_username = lookup("ADMIN_USERNAME").unwrap_or_else(|| "admin".to_string());
        let admin_email =
            lookup("ADMIN_EMAIL").unwrap_or_else(|| "admin@example.com".to_string());
        let admin_password = lookup("ADMIN_PASSWORD").or_else(|| {
            (!environment.is_production()).then(|| DEV_ADMIN_PASSWORD.to_string())
        });

        Ok(Config {
            database_url,
            environment,
            host,
            port,
            db_max_connections,
            cors_allowed_origins,
            log_level,
            jwt_secret,
            jwt_ttl_seconds,
            bcrypt_cost,
            admin_username,
            admin_email,
            admin_password,
        })
    }

    /// Admin account to seed at startup, if any
    pub fn admin_seed(&self) -> Option<AdminSeed> {
        self.admin_password.as_ref().map(|password| AdminSeed {
            username: self.admin_username.clone(),
            email: self.admin_email.clone(),
            password: password.clone(),
        })
    }

    /// Socket address string to bind
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get database URL (useful for logging masked version)
    pub fn database_url_masked(&self) -> String {
        if let Some(at_pos) = self.database_url.find('@') {
            if let Some(colon_pos) = self.database_url[..at_pos].rfind(':') {
                let prefix = &self.database_url[..colon_pos + 1];
                let suffix = &self.database_url[at_pos..];
                return format!("{}****{}", prefix, suffix);
            }
        }
        self.database_url.clone()
    }
}

/// Parse an optional numeric variable, falling back to `default` when unset
/// or malformed
fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key)
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}
