//! Agreement Domain Ports
//!
//! One repository trait per aggregate root. Use cases depend on these traits
//! only; the PostgreSQL and in-memory adapters in `infra_db` implement them
//! against whatever database handle they were built with.
//!
//! # Contract
//!
//! - `find` style lookups return `Ok(None)` when nothing matches
//! - Writes succeed silently; uniqueness and foreign-key violations come
//!   back as [`StorageError`] variants and are never translated into domain
//!   errors here
//! - Child collections (service systems, users list items) are written and
//!   read together with their root
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_agreement::ports::PlanRepository;
//! use std::sync::Arc;
//!
//! pub struct CreatePlanUseCase {
//!     plans: Arc<dyn PlanRepository>,
//! }
//! ```

use async_trait::async_trait;

use core_kernel::{AgreementId, PlanId, ServiceId, StorageError, SystemId, UserId, UsersListId};

use crate::agreement::Agreement;
use crate::plan::Plan;
use crate::service::Service;
use crate::system::System;
use crate::user::User;
use crate::users_list::UsersList;

#[async_trait]
pub trait PlanRepository: Send + Sync {
    async fn insert(&self, plan: &Plan) -> Result<(), StorageError>;
    async fn update(&self, plan: &Plan) -> Result<(), StorageError>;
    async fn delete(&self, id: PlanId) -> Result<(), StorageError>;
    async fn find(&self, id: PlanId) -> Result<Option<Plan>, StorageError>;
    async fn find_by_code(&self, code: &str) -> Result<Option<Plan>, StorageError>;
    async fn find_all(&self) -> Result<Vec<Plan>, StorageError>;
}

#[async_trait]
pub trait SystemRepository: Send + Sync {
    async fn insert(&self, system: &System) -> Result<(), StorageError>;
    async fn update(&self, system: &System) -> Result<(), StorageError>;
    async fn delete(&self, id: SystemId) -> Result<(), StorageError>;
    async fn find(&self, id: SystemId) -> Result<Option<System>, StorageError>;
    async fn find_all(&self) -> Result<Vec<System>, StorageError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn insert(&self, user: &User) -> Result<(), StorageError>;
    async fn update(&self, user: &User) -> Result<(), StorageError>;
    async fn delete(&self, id: UserId) -> Result<(), StorageError>;
    async fn find(&self, id: UserId) -> Result<Option<User>, StorageError>;
    /// Looks a user up by email, ignoring case and surrounding whitespace
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StorageError>;
    async fn find_all(&self) -> Result<Vec<User>, StorageError>;
}

#[async_trait]
pub trait AgreementRepository: Send + Sync {
    async fn insert(&self, agreement: &Agreement) -> Result<(), StorageError>;
    async fn update(&self, agreement: &Agreement) -> Result<(), StorageError>;
    async fn delete(&self, id: AgreementId) -> Result<(), StorageError>;
    async fn find(&self, id: AgreementId) -> Result<Option<Agreement>, StorageError>;
    /// All revisions of every agreement for a year, oldest revision first
    async fn find_by_year(&self, year: i32) -> Result<Vec<Agreement>, StorageError>;
    async fn find_all(&self) -> Result<Vec<Agreement>, StorageError>;
}

/// Persists services together with their system associations
#[async_trait]
pub trait ServiceRepository: Send + Sync {
    async fn insert(&self, service: &Service) -> Result<(), StorageError>;
    async fn update(&self, service: &Service) -> Result<(), StorageError>;
    async fn delete(&self, id: ServiceId) -> Result<(), StorageError>;
    async fn find(&self, id: ServiceId) -> Result<Option<Service>, StorageError>;
    async fn find_by_agreement(&self, agreement_id: AgreementId) -> Result<Vec<Service>, StorageError>;
}

/// Persists users lists together with their items
#[async_trait]
pub trait UsersListRepository: Send + Sync {
    async fn insert(&self, list: &UsersList) -> Result<(), StorageError>;
    async fn update(&self, list: &UsersList) -> Result<(), StorageError>;
    async fn delete(&self, id: UsersListId) -> Result<(), StorageError>;
    async fn find(&self, id: UsersListId) -> Result<Option<UsersList>, StorageError>;
    async fn find_by_service(&self, service_id: ServiceId) -> Result<Option<UsersList>, StorageError>;
    async fn find_by_system(&self, system_id: SystemId) -> Result<Vec<UsersList>, StorageError>;
}
