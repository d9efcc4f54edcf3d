//! Service Agreement Domain
//!
//! Entities of the service agreement system and the repository ports they
//! are persisted through.
//!
//! # Aggregates
//!
//! - **Plan**: yearly budget reference with a euro value
//! - **System**: application consuming services
//! - **User**: application user with a role
//! - **Agreement**: yearly agreement referencing a provider and a local plan
//! - **Service**: contracted service owning its system allocations
//! - **UsersList**: users of a system for a service, owning its items
//!
//! Aggregates reference each other by id only. Keeping references
//! consistent across aggregates is the unit of work's job.
//!
//! # Examples
//!
//! ```rust
//! use domain_agreement::{Service, ServiceDetails};
//! use core_kernel::{AgreementId, Currency, SystemId};
//! use rust_decimal_macros::dec;
//!
//! let mut service = Service::create(AgreementId::new(), ServiceDetails {
//!     name: "Hosting".to_string(),
//!     description: String::new(),
//!     run_amount: dec!(1000),
//!     change_amount: dec!(0),
//!     currency: Currency::EUR,
//!     responsible_email: "owner@example.com".to_string(),
//!     provider_allocation: dec!(50),
//!     local_allocation: dec!(50),
//! }).unwrap();
//!
//! service.save_service_system(SystemId::new(), dec!(50.00)).unwrap();
//! service.save_service_system(SystemId::new(), dec!(50.00)).unwrap();
//! assert!(service.is_active());
//! ```

pub mod agreement;
pub mod error;
pub mod plan;
pub mod ports;
pub mod service;
pub mod system;
pub mod user;
pub mod users_list;

pub use agreement::{Agreement, AgreementTerms};
pub use error::DomainError;
pub use plan::Plan;
pub use ports::{
    AgreementRepository, PlanRepository, ServiceRepository, SystemRepository,
    UserRepository, UsersListRepository,
};
pub use service::{Service, ServiceDetails, ServiceStatus, ServiceSystem, FULL_ALLOCATION, MAX_AMOUNT};
pub use system::System;
pub use user::{normalize_email, User, UserRole};
pub use users_list::{UsersList, UsersListItem, UsersListItemData};
