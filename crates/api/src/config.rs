//! Environment-driven configuration.

use chrono::Duration;

/// Process configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Socket address to bind, e.g. `0.0.0.0:8080`.
    pub listen_addr: String,

    /// Postgres connection string. When unset the server runs with
    /// in-memory stores (development only; nothing survives a restart).
    pub database_url: Option<String>,

    pub db_max_connections: u32,

    /// Symmetric token-signing secret, loaded once and never rotated.
    pub jwt_secret: String,

    /// Token lifetime.
    pub token_ttl: Duration,

    /// Issuer claim stamped into every token.
    pub issuer: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let jwt_secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| {
            tracing::warn!("JWT_SECRET not set; using insecure dev default");
            "dev-secret".to_string()
        });

        Self {
            listen_addr: env_or("SERVER_ADDR", "0.0.0.0:8080"),
            database_url: std::env::var("DATABASE_URL").ok(),
            db_max_connections: env_or_parsed("DB_MAX_OPEN", 25),
            jwt_secret,
            token_ttl: Duration::hours(env_or_parsed("JWT_EXPIRE_HOURS", 24)),
            issuer: env_or("JWT_ISSUER", "warden"),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_or_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
