//! Agreement domain errors

use thiserror::Error;

use core_kernel::MoneyError;

/// Errors raised when an entity invariant would be violated
///
/// Every variant renders a message fit to show to the user who submitted
/// the change.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{0}")]
    Validation(String),

    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Invalid allocation: {0}")]
    InvalidAllocation(String),

    #[error("Money error: {0}")]
    Money(#[from] MoneyError),
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        DomainError::Validation(message.into())
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        DomainError::InvalidStateTransition(message.into())
    }

    pub fn invalid_allocation(message: impl Into<String>) -> Self {
        DomainError::InvalidAllocation(message.into())
    }
}
