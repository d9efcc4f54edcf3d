//! Admin Interface
//!
//! Operational entry points for the agreement database: apply the schema
//! and check that the database answers. The `agreements-admin` binary wraps
//! these with configuration loading and logging setup.

pub mod config;

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use core_kernel::{AdapterHealth, HealthCheckResult, HealthCheckable};
use infra_db::{DatabaseError, PgHandle};

pub use config::AdminConfig;

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("Unknown command '{0}', expected 'migrate' or 'check'")]
    UnknownCommand(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("Database is unhealthy: {0}")]
    Unhealthy(String),
}

/// Admin command selected by the first argument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Apply pending schema migrations
    Migrate,
    /// Run a health check against the database
    Check,
}

impl FromStr for Command {
    type Err = AdminError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "migrate" => Ok(Command::Migrate),
            "check" => Ok(Command::Check),
            other => Err(AdminError::UnknownCommand(other.to_string())),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Migrate => f.write_str("migrate"),
            Command::Check => f.write_str("check"),
        }
    }
}

/// Initializes the tracing subscriber
///
/// `RUST_LOG` wins over the configured level when set.
pub fn init_tracing(config: &AdminConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    if config.log_json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer().with_target(true)).init();
    }
}

/// Runs `command` against the database behind `handle`
pub async fn run(command: Command, handle: &PgHandle) -> Result<(), AdminError> {
    info!(%command, "running admin command");
    match command {
        Command::Migrate => match handle {
            PgHandle::Pool(pool) => Ok(infra_db::migrate::run(pool).await?),
            PgHandle::Transaction(_) => Err(AdminError::Database(DatabaseError::transaction(
                "migrations need the pool, not a transaction",
            ))),
        },
        Command::Check => {
            let result = handle.health_check().await;
            report(&result)
        }
    }
}

fn report(result: &HealthCheckResult) -> Result<(), AdminError> {
    match result.status {
        AdapterHealth::Healthy => {
            info!(latency_ms = result.latency_ms, "database is healthy");
            Ok(())
        }
        AdapterHealth::Unhealthy => {
            let message = result.message.clone().unwrap_or_default();
            warn!(latency_ms = result.latency_ms, %message, "database is unhealthy");
            Err(AdminError::Unhealthy(message))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_result(status: AdapterHealth, message: Option<&str>) -> HealthCheckResult {
        HealthCheckResult {
            adapter_id: "postgres".to_string(),
            status,
            latency_ms: 3,
            message: message.map(str::to_string),
            checked_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!("migrate".parse::<Command>().unwrap(), Command::Migrate);
        assert_eq!(" check ".parse::<Command>().unwrap(), Command::Check);

        let err = "seed".parse::<Command>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown command 'seed', expected 'migrate' or 'check'");
    }

    #[test]
    fn test_report_maps_health() {
        assert!(report(&check_result(AdapterHealth::Healthy, None)).is_ok());

        let err = report(&check_result(AdapterHealth::Unhealthy, Some("connection refused"))).unwrap_err();
        assert_eq!(err.to_string(), "Database is unhealthy: connection refused");
    }
}
