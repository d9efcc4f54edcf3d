//! Service Agreements - Admin Binary
//!
//! # Usage
//!
//! ```bash
//! # Apply the schema
//! agreements-admin migrate
//!
//! # Check that the database answers
//! ADMIN_DATABASE_URL=postgres://... agreements-admin check
//! ```
//!
//! # Environment Variables
//!
//! * `ADMIN_DATABASE_URL` - PostgreSQL connection string
//! * `ADMIN_MAX_CONNECTIONS` / `ADMIN_MIN_CONNECTIONS` - Pool size
//! * `ADMIN_CONNECT_TIMEOUT_SECS` - Seconds to wait for a connection
//! * `ADMIN_LOG_LEVEL` - Log filter (default: info); `RUST_LOG` overrides it
//! * `ADMIN_LOG_JSON` - Emit JSON logs when `true`

use anyhow::Context;

use interface_admin::{init_tracing, run, AdminConfig, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = AdminConfig::from_env().unwrap_or_else(|err| {
        eprintln!("Invalid ADMIN_* configuration ({err}), using defaults");
        AdminConfig::default()
    });
    init_tracing(&config);

    let command: Command = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "check".to_string())
        .parse()?;

    let handle = infra_db::connect(config.database())
        .await
        .context("connecting to the database")?;

    run(command, &handle).await?;
    tracing::info!(%command, "done");
    Ok(())
}
