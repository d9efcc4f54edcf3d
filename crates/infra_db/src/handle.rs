//! Database handles
//!
//! A handle is what repositories are built with. It is either the ambient
//! connection pool or one open transaction, and repositories run the same
//! statements against both without knowing which one they hold.
//!
//! Transactions are flat: a transaction handle cannot begin another one.
//! Committing consumes the transaction; dropping the last clone of an
//! uncommitted transaction handle rolls it back.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::{Query, QueryAs};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use tokio::sync::Mutex;

use core_kernel::{AdapterHealth, HealthCheckResult, HealthCheckable};

use crate::error::DatabaseError;

/// Connection abstraction shared by every storage backend
#[async_trait]
pub trait DatabaseHandle: Clone + Send + Sync + 'static {
    /// Opens a transaction and returns a handle scoped to it
    async fn begin(&self) -> Result<Self, DatabaseError>;

    /// Commits the transaction this handle is scoped to
    async fn commit(&self) -> Result<(), DatabaseError>;

    /// Returns true when this handle is scoped to a transaction
    fn is_transaction(&self) -> bool;
}

type SharedTransaction = Arc<Mutex<Option<Transaction<'static, Postgres>>>>;

/// PostgreSQL handle: the pool, or one transaction taken from it
///
/// The transaction sits behind a mutex so statements issued through clones
/// of the same handle run one at a time.
#[derive(Clone)]
pub enum PgHandle {
    Pool(PgPool),
    Transaction(SharedTransaction),
}

impl fmt::Debug for PgHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PgHandle::Pool(_) => f.write_str("PgHandle::Pool"),
            PgHandle::Transaction(_) => f.write_str("PgHandle::Transaction"),
        }
    }
}

impl PgHandle {
    pub fn new(pool: PgPool) -> Self {
        PgHandle::Pool(pool)
    }

    /// Runs a statement and returns the number of affected rows
    pub async fn execute<'q>(&self, query: Query<'q, Postgres, PgArguments>) -> Result<u64, DatabaseError> {
        let result = match self {
            PgHandle::Pool(pool) => query.execute(pool).await?,
            PgHandle::Transaction(shared) => {
                let mut guard = shared.lock().await;
                let tx = guard.as_mut().ok_or_else(finished)?;
                query.execute(&mut **tx).await?
            }
        };
        Ok(result.rows_affected())
    }

    pub async fn fetch_optional<'q, T>(
        &self,
        query: QueryAs<'q, Postgres, T, PgArguments>,
    ) -> Result<Option<T>, DatabaseError>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let row = match self {
            PgHandle::Pool(pool) => query.fetch_optional(pool).await?,
            PgHandle::Transaction(shared) => {
                let mut guard = shared.lock().await;
                let tx = guard.as_mut().ok_or_else(finished)?;
                query.fetch_optional(&mut **tx).await?
            }
        };
        Ok(row)
    }

    pub async fn fetch_all<'q, T>(&self, query: QueryAs<'q, Postgres, T, PgArguments>) -> Result<Vec<T>, DatabaseError>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let rows = match self {
            PgHandle::Pool(pool) => query.fetch_all(pool).await?,
            PgHandle::Transaction(shared) => {
                let mut guard = shared.lock().await;
                let tx = guard.as_mut().ok_or_else(finished)?;
                query.fetch_all(&mut **tx).await?
            }
        };
        Ok(rows)
    }

    /// Returns a transaction handle and whether it was opened here
    ///
    /// Writes spanning several statements use this to stay atomic: on the
    /// pool a local transaction is opened and must be committed by the
    /// caller; inside a transaction the handle itself is reused.
    pub(crate) async fn local_transaction(&self) -> Result<(PgHandle, bool), DatabaseError> {
        if self.is_transaction() {
            Ok((self.clone(), false))
        } else {
            Ok((self.begin().await?, true))
        }
    }
}

fn finished() -> DatabaseError {
    DatabaseError::transaction("Transaction has already been committed")
}

#[async_trait]
impl DatabaseHandle for PgHandle {
    async fn begin(&self) -> Result<Self, DatabaseError> {
        match self {
            PgHandle::Pool(pool) => {
                let tx = pool.begin().await?;
                Ok(PgHandle::Transaction(Arc::new(Mutex::new(Some(tx)))))
            }
            PgHandle::Transaction(_) => Err(DatabaseError::transaction(
                "Nested transactions are not supported",
            )),
        }
    }

    async fn commit(&self) -> Result<(), DatabaseError> {
        match self {
            PgHandle::Pool(_) => Err(DatabaseError::transaction("No transaction to commit")),
            PgHandle::Transaction(shared) => {
                let tx = shared.lock().await.take().ok_or_else(finished)?;
                tx.commit().await?;
                Ok(())
            }
        }
    }

    fn is_transaction(&self) -> bool {
        matches!(self, PgHandle::Transaction(_))
    }
}

#[async_trait]
impl HealthCheckable for PgHandle {
    async fn health_check(&self) -> HealthCheckResult {
        let start = std::time::Instant::now();

        let result = match self {
            PgHandle::Pool(pool) => sqlx::query_scalar::<_, i32>("SELECT 1")
                .fetch_one(pool)
                .await
                .map_err(DatabaseError::from),
            PgHandle::Transaction(shared) => {
                let mut guard = shared.lock().await;
                match guard.as_mut() {
                    Some(tx) => sqlx::query_scalar::<_, i32>("SELECT 1")
                        .fetch_one(&mut **tx)
                        .await
                        .map_err(DatabaseError::from),
                    None => Err(finished()),
                }
            }
        };

        let latency_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(_) => HealthCheckResult {
                adapter_id: "postgres".to_string(),
                status: AdapterHealth::Healthy,
                latency_ms,
                message: None,
                checked_at: Utc::now(),
            },
            Err(e) => HealthCheckResult {
                adapter_id: "postgres".to_string(),
                status: AdapterHealth::Unhealthy,
                latency_ms,
                message: Some(format!("Database error: {}", e)),
                checked_at: Utc::now(),
            },
        }
    }
}
