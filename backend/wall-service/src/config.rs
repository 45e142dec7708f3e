/// Configuration management for the wall service
///
/// Loads configuration from environment variables.
use anyhow::{Context, Result};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Token issuing and verification
    pub auth: AuthConfig,
    /// Background job tuning
    pub jobs: JobConfig,
}

/// Application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, production)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// HTTP port
    pub port: u16,
    /// Comma separated list of allowed CORS origins, `*` allows any
    pub cors_allowed_origins: String,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Postgres URL. When unset the service runs on the in-memory store.
    pub url: Option<String>,
    /// Max connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Apply pending migrations on startup
    #[serde(default = "default_run_migrations")]
    pub run_migrations: bool,
}

/// Token configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret used to sign tokens
    pub token_secret: String,
    /// Token lifetime in seconds
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: i64,
}

/// Background job configuration
#[derive(Debug, Clone, Deserialize)]
pub struct JobConfig {
    /// Seconds between cleanup sweeps, 0 disables the sweeper
    #[serde(default = "default_cleanup_sweep_secs")]
    pub cleanup_sweep_secs: u64,
}

// Default values
fn default_max_connections() -> u32 {
    20
}

fn default_run_migrations() -> bool {
    true
}

fn default_token_ttl_secs() -> i64 {
    3600
}

fn default_cleanup_sweep_secs() -> u64 {
    300
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let app = AppConfig {
            env: std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(8080),
            cors_allowed_origins: std::env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "*".to_string()),
        };

        let database = DatabaseConfig {
            url: std::env::var("DATABASE_URL").ok(),
            max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(default_max_connections),
            run_migrations: std::env::var("RUN_MIGRATIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(default_run_migrations),
        };

        let auth = AuthConfig {
            token_secret: std::env::var("TOKEN_SECRET")
                .context("TOKEN_SECRET environment variable not set")?,
            token_ttl_secs: std::env::var("TOKEN_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(default_token_ttl_secs),
        };

        let jobs = JobConfig {
            cleanup_sweep_secs: std::env::var("CLEANUP_SWEEP_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(default_cleanup_sweep_secs),
        };

        Ok(Config {
            app,
            database,
            auth,
            jobs,
        })
    }

    pub fn is_production(&self) -> bool {
        self.app.env == "production"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for key in [
            "APP_ENV",
            "APP_HOST",
            "PORT",
            "CORS_ALLOWED_ORIGINS",
            "DATABASE_URL",
            "DB_MAX_CONNECTIONS",
            "RUN_MIGRATIONS",
            "TOKEN_SECRET",
            "TOKEN_TTL_SECS",
            "CLEANUP_SWEEP_SECS",
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_default_values() {
        clear_env();
        std::env::set_var("TOKEN_SECRET", "test-secret");

        let config = Config::from_env().unwrap();

        assert_eq!(config.app.env, "development");
        assert_eq!(config.app.host, "0.0.0.0");
        assert_eq!(config.app.port, 8080);
        assert_eq!(config.app.cors_allowed_origins, "*");
        assert!(config.database.url.is_none());
        assert_eq!(config.database.max_connections, 20);
        assert!(config.database.run_migrations);
        assert_eq!(config.auth.token_ttl_secs, 3600);
        assert_eq!(config.jobs.cleanup_sweep_secs, 300);
        assert!(!config.is_production());
    }

    #[test]
    #[serial]
    fn test_missing_token_secret_is_an_error() {
        clear_env();

        assert!(Config::from_env().is_err());
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        clear_env();
        std::env::set_var("TOKEN_SECRET", "test-secret");
        std::env::set_var("APP_ENV", "production");
        std::env::set_var("PORT", "9001");
        std::env::set_var("DATABASE_URL", "postgres://test");
        std::env::set_var("TOKEN_TTL_SECS", "120");
        std::env::set_var("CLEANUP_SWEEP_SECS", "0");

        let config = Config::from_env().unwrap();

        assert!(config.is_production());
        assert_eq!(config.app.port, 9001);
        assert_eq!(config.database.url.as_deref(), Some("postgres://test"));
        assert_eq!(config.auth.token_ttl_secs, 120);
        assert_eq!(config.jobs.cleanup_sweep_secs, 0);

        clear_env();
    }
}
