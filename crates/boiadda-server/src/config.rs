//! Server configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the server can start with zero
//! configuration for local development.

use std::net::SocketAddr;
use std::path::PathBuf;

use boiadda_lending::DEFAULT_LOAN_PERIOD_DAYS;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) API server.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:8000`
    pub http_addr: SocketAddr,

    /// Filesystem path of the SQLite database.
    /// Env: `DATABASE_PATH`
    /// Default: `./boiadda.db`
    pub database_path: PathBuf,

    /// Loan period applied when a borrow request is approved, in days.
    /// Env: `LOAN_PERIOD_DAYS`
    /// Default: `14`
    pub loan_period_days: i64,

    /// Lifetime of an auth session, in minutes.
    /// Env: `SESSION_TTL_MINUTES`
    /// Default: `1440` (24 hours)
    pub session_ttl_minutes: i64,

    /// Whether to load the Bengali demo users/books into an empty database
    /// on startup.
    /// Env: `SEED_DEMO_DATA` (true/false)
    /// Default: `true`
    pub seed_demo_data: bool,

    /// Human-readable name for this library instance.
    /// Env: `INSTANCE_NAME`
    /// Default: `"বই আড্ডা"`
    pub instance_name: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], 8000).into(),
            database_path: PathBuf::from("./boiadda.db"),
            loan_period_days: DEFAULT_LOAN_PERIOD_DAYS,
            session_ttl_minutes: 24 * 60,
            seed_demo_data: true,
            instance_name: "বই আড্ডা".to_string(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("HTTP_ADDR") {
            if let Ok(parsed) = addr.parse::<SocketAddr>() {
                config.http_addr = parsed;
            } else {
                tracing::warn!(
                    value = %addr,
                    "Invalid HTTP_ADDR, using default"
                );
            }
        }

        if let Ok(path) = std::env::var("DATABASE_PATH") {
            config.database_path = PathBuf::from(path);
        }

        if let Ok(val) = std::env::var("LOAN_PERIOD_DAYS") {
            match val.parse::<i64>() {
                Ok(days) if days > 0 => config.loan_period_days = days,
                _ => {
                    tracing::warn!(value = %val, "Invalid LOAN_PERIOD_DAYS, using default");
                }
            }
        }

        if let Ok(val) = std::env::var("SESSION_TTL_MINUTES") {
            match val.parse::<i64>() {
                Ok(minutes) if minutes > 0 => config.session_ttl_minutes = minutes,
                _ => {
                    tracing::warn!(value = %val, "Invalid SESSION_TTL_MINUTES, using default");
                }
            }
        }

        if let Ok(val) = std::env::var("SEED_DEMO_DATA") {
            config.seed_demo_data = val != "false" && val != "0";
        }

        if let Ok(name) = std::env::var("INSTANCE_NAME") {
            if !name.is_empty() {
                config.instance_name = name;
            }
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.http_addr, ([0, 0, 0, 0], 8000).into());
        assert_eq!(config.loan_period_days, 14);
        assert_eq!(config.session_ttl_minutes, 1440);
        assert!(config.seed_demo_data);
    }
}
