//! Schema migrations
//!
//! The SQL files under `migrations/` are embedded at build time.

use sqlx::migrate::Migrator;
use sqlx::PgPool;
use tracing::info;

use crate::error::DatabaseError;

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Applies every pending migration
pub async fn run(pool: &PgPool) -> Result<(), DatabaseError> {
    info!(migrations = MIGRATOR.iter().count(), "Applying schema migrations");
    MIGRATOR.run(pool).await?;
    info!("Schema is up to date");
    Ok(())
}
