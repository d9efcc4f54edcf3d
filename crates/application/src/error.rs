//! Use case errors

use std::fmt;

use thiserror::Error;

use core_kernel::StorageError;
use domain_agreement::DomainError;
use infra_db::UnitOfWorkError;

/// Failure of a use case, as reported to the action boundary
#[derive(Debug, Error)]
pub enum UseCaseError {
    /// Input or state the caller can fix; the message is user-facing
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The unit of work was wired incorrectly
    #[error("Configuration error: {0}")]
    Configuration(UnitOfWorkError),
}

impl UseCaseError {
    pub fn validation(message: impl Into<String>) -> Self {
        UseCaseError::Validation(message.into())
    }

    /// `<Entity> ID #<id> not found`
    pub fn not_found(entity: &str, id: impl fmt::Display) -> Self {
        UseCaseError::Validation(format!("{} ID #{} not found", entity, id))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, UseCaseError::Validation(_))
    }
}

impl From<DomainError> for UseCaseError {
    fn from(error: DomainError) -> Self {
        UseCaseError::Validation(error.to_string())
    }
}

impl From<UnitOfWorkError> for UseCaseError {
    fn from(error: UnitOfWorkError) -> Self {
        match error {
            UnitOfWorkError::Storage(storage) => UseCaseError::Storage(storage),
            other => UseCaseError::Configuration(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use infra_db::RepositoryKind;

    #[test]
    fn test_domain_errors_become_validation_messages() {
        let err: UseCaseError = DomainError::validation("Plan code is required").into();
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "Plan code is required");
    }

    #[test]
    fn test_storage_inside_unit_of_work_error_is_unwrapped() {
        let err: UseCaseError = UnitOfWorkError::Storage(StorageError::transaction("lost")).into();
        assert!(matches!(err, UseCaseError::Storage(StorageError::Transaction { .. })));

        let err: UseCaseError = UnitOfWorkError::NotRegistered(RepositoryKind::Plan).into();
        assert!(matches!(err, UseCaseError::Configuration(_)));
        assert_eq!(err.to_string(), "Configuration error: Repository PlanRepository not registered");
    }

    #[test]
    fn test_not_found_message() {
        let err = UseCaseError::not_found("Service", "0190");
        assert_eq!(err.to_string(), "Service ID #0190 not found");
    }
}
