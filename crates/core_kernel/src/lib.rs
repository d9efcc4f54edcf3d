//! Core Kernel - Foundational types shared by every layer of the agreement system
//!
//! This crate provides the building blocks used by the domain, infrastructure
//! and application crates:
//! - Strongly-typed identifiers for every aggregate
//! - Money and currency types with precise decimal arithmetic
//! - The storage error taxonomy returned by repository ports

pub mod money;
pub mod identifiers;
pub mod storage;

pub use money::{Money, Currency, MoneyError, compare_amounts, percentage_of};
pub use identifiers::{
    PlanId, SystemId, UserId, AgreementId, ServiceId,
    UsersListId, UsersListItemId,
};
pub use storage::{StorageError, AdapterHealth, HealthCheckResult, HealthCheckable};
