//! Repository implementations for domain aggregates
//!
//! Each repository is built with a [`PgHandle`] and runs the same statements
//! whether that handle is the pool or an open transaction. Rows are mapped
//! back to entities through their `restore` constructors.
//!
//! # Architecture
//!
//! Each repository follows these principles:
//! - Runtime-checked queries with `sqlx::query` / `query_as` and `FromRow` rows
//! - Child collections rewritten together with their root
//! - Multi-statement writes atomic on their own

pub mod agreement;
pub mod plan;
pub mod service;
pub mod system;
pub mod user;
pub mod users_list;

pub use agreement::PgAgreementRepository;
pub use plan::PgPlanRepository;
pub use service::PgServiceRepository;
pub use system::PgSystemRepository;
pub use user::PgUserRepository;
pub use users_list::PgUsersListRepository;

use crate::handle::PgHandle;
use crate::unit_of_work::RepositoryRegistry;

/// Registry with every PostgreSQL repository registered
pub fn postgres_registry() -> RepositoryRegistry<PgHandle> {
    RepositoryRegistry::new()
        .plans(PgPlanRepository::new)
        .systems(PgSystemRepository::new)
        .users(PgUserRepository::new)
        .agreements(PgAgreementRepository::new)
        .services(PgServiceRepository::new)
        .users_lists(PgUsersListRepository::new)
}
