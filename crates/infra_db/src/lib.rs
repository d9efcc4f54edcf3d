//! Infrastructure Database Layer
//!
//! Storage for the agreement system: the PostgreSQL repositories, the
//! in-memory backend used by tests, and the unit of work that runs work
//! spanning several repositories in one transaction.
//!
//! # Architecture
//!
//! Repositories are built from a database handle. The handle is either the
//! ambient pool or an open transaction; a [`UnitOfWork`] rebuilds its
//! repositories against a transaction for the duration of `execute`.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{connect, postgres_registry, DatabaseConfig, UnitOfWork};
//!
//! let handle = connect(DatabaseConfig::new("postgres://localhost/agreements")).await?;
//! let uow = UnitOfWork::new(handle, postgres_registry());
//! let plans = uow.plans()?.find_all().await?;
//! ```

pub mod error;
pub mod handle;
#[cfg(any(test, feature = "memory"))]
pub mod memory;
pub mod migrate;
pub mod pool;
pub mod repositories;
pub mod unit_of_work;

pub use error::DatabaseError;
pub use handle::{DatabaseHandle, PgHandle};
#[cfg(any(test, feature = "memory"))]
pub use memory::{memory_registry, MemoryHandle};
pub use pool::{connect, create_pool, DatabaseConfig, DatabasePool};
pub use repositories::postgres_registry;
pub use unit_of_work::{
    Repository, RepositoryKind, RepositoryRegistry, UnitOfWork, UnitOfWorkError, UnitOfWorkState,
    WorkFuture,
};
