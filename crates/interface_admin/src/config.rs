//! Admin configuration

use std::time::Duration;

use serde::Deserialize;

use infra_db::DatabaseConfig;

/// Admin configuration
///
/// Every field can be set through an `ADMIN_*` environment variable, for
/// example `ADMIN_DATABASE_URL` or `ADMIN_LOG_JSON=true`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Database URL
    pub database_url: String,
    /// Maximum pool size
    pub max_connections: u32,
    /// Minimum pool size
    pub min_connections: u32,
    /// Seconds to wait for a connection
    pub connect_timeout_secs: u64,
    /// Log filter directive, e.g. `info` or `infra_db=debug`
    pub log_level: String,
    /// Emit logs as JSON lines
    pub log_json: bool,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            database_url: "postgres://localhost/agreements".to_string(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout_secs: 30,
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

impl AdminConfig {
    /// Loads configuration from environment
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix("ADMIN").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Pool settings for the configured database
    pub fn database(&self) -> DatabaseConfig {
        DatabaseConfig::new(self.database_url.clone())
            .max_connections(self.max_connections)
            .min_connections(self.min_connections.min(self.max_connections))
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AdminConfig::default();
        assert_eq!(config.database_url, "postgres://localhost/agreements");
        assert!(!config.log_json);
    }

    #[test]
    fn test_database_config_follows_pool_settings() {
        let config = AdminConfig {
            max_connections: 3,
            min_connections: 8,
            connect_timeout_secs: 5,
            ..AdminConfig::default()
        };
        let database = config.database();
        assert_eq!(database.max_connections, 3);
        assert_eq!(database.min_connections, 3);
        assert_eq!(database.connect_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_missing_values_fall_back_to_defaults() {
        let config: AdminConfig = config::Config::builder()
            .set_override("log_level", "debug")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.max_connections, 5);
    }
}
