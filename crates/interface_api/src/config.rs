//! API configuration

use std::time::Duration;

use core_kernel::Currency;
use infra_db::DatabaseConfig;
use serde::Deserialize;

/// API configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// JWT secret for authentication
    pub jwt_secret: String,
    /// JWT expiration in seconds
    pub jwt_expiration_secs: u64,
    /// Database URL
    pub database_url: String,
    /// Log level
    pub log_level: String,
    /// Upper bound of the database pool
    pub max_connections: u32,
    /// Idle connections kept open
    pub min_connections: u32,
    /// Seconds a request waits for a pooled connection
    pub db_acquire_timeout_secs: u64,
    /// Currency assumed when a request omits one
    pub default_currency: Currency,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            jwt_secret: "change-me-in-production".to_string(),
            jwt_expiration_secs: 3600,
            database_url: "postgres://localhost/crew_ops".to_string(),
            log_level: "info".to_string(),
            max_connections: 10,
            min_connections: 1,
            db_acquire_timeout_secs: 10,
            default_currency: Currency::MYR,
        }
    }
}

impl ApiConfig {
    /// Loads configuration from `API_*` environment variables over the defaults
    ///
    /// `DATABASE_URL` is honoured when `API_DATABASE_URL` is unset.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| Self::default().database_url);
        config::Config::builder()
            .set_default("database_url", database_url)?
            .add_source(config::Environment::with_prefix("API"))
            .build()?
            .try_deserialize()
    }

    /// Pool settings for `infra_db::create_pool`
    pub fn database(&self) -> DatabaseConfig {
        DatabaseConfig::new(self.database_url.clone())
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(Duration::from_secs(self.db_acquire_timeout_secs))
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ApiConfig::default();
        assert_eq!(config.server_addr(), "0.0.0.0:8080");
        assert_eq!(config.default_currency, Currency::MYR);
    }

    #[test]
    fn test_database_settings_follow_api_config() {
        let config = ApiConfig {
            database_url: "postgres://db/crew".to_string(),
            max_connections: 4,
            min_connections: 2,
            db_acquire_timeout_secs: 3,
            ..ApiConfig::default()
        };

        let database = config.database();

        assert_eq!(database.url, "postgres://db/crew");
        assert_eq!(database.max_connections, 4);
        assert_eq!(database.min_connections, 2);
        assert_eq!(database.acquire_timeout, Duration::from_secs(3));
    }
}
