//! Application Layer
//!
//! Use cases of the service agreement system. Catalog entities (plans,
//! systems, users) change one aggregate at a time and take their repository
//! directly. Everything that touches more than one aggregate runs through
//! [`infra_db::UnitOfWork::execute`], so its writes commit or roll back
//! together. Those use cases check in `new` that every repository they use
//! is registered.
//!
//! # Example
//!
//! ```rust,ignore
//! use application::{SaveServiceSystemInput, SaveServiceSystemUseCase};
//! use infra_db::{postgres_registry, UnitOfWork};
//!
//! let use_case = SaveServiceSystemUseCase::new(UnitOfWork::new(handle, postgres_registry()))?;
//! let service = use_case
//!     .execute(SaveServiceSystemInput { service_id, system_id, allocation: dec!(50.00) })
//!     .await?;
//! ```

pub mod agreements;
pub mod error;
pub mod plans;
pub mod services;
pub mod systems;
pub mod users;
pub mod users_lists;

pub use agreements::{CreateAgreementInput, CreateAgreementUseCase, ReviseAgreementUseCase};
pub use error::UseCaseError;
pub use plans::{CreatePlanUseCase, DeletePlanUseCase, PlanInput, UpdatePlanUseCase};
pub use services::{
    ChangeServiceStatusInput, ChangeServiceStatusUseCase, CreateServiceInput, CreateServiceUseCase,
    DeleteServiceUseCase, RemoveServiceSystemInput, RemoveServiceSystemUseCase, SaveServiceSystemInput,
    SaveServiceSystemUseCase, ServiceAction,
};
pub use systems::{CreateSystemUseCase, SystemInput, UpdateSystemUseCase};
pub use users::{ChangeUserRoleInput, ChangeUserRoleUseCase, CreateUserInput, CreateUserUseCase};
pub use users_lists::{
    RemoveUsersListItemInput, RemoveUsersListItemUseCase, SaveUsersListItemInput, SaveUsersListItemUseCase,
};
