//! Storage-facing contracts shared by repository ports and their adapters
//!
//! Repository traits live in the domain crates and only depend on this
//! module, so a PostgreSQL adapter and an in-memory adapter report failures
//! through the same error type.
//!
//! ```text
//! ┌──────────────────────────────┐
//! │   Use cases (application)    │
//! └──────────────────────────────┘
//!                │
//!                ▼
//! ┌──────────────────────────────┐
//! │  Repository ports (domain)   │──── Result<T, StorageError>
//! └──────────────────────────────┘
//!         ▲               ▲
//!   ┌─────┴─────┐   ┌─────┴─────┐
//!   │ PgHandle  │   │ In-memory │
//!   └───────────┘   └───────────┘
//! ```

use std::fmt;
use thiserror::Error;
use serde::{Deserialize, Serialize};

/// Error type for repository operations
///
/// Absence is not an error: `find` style lookups return `Ok(None)`.
/// These variants describe failures of the storage engine itself, which use
/// cases propagate unchanged.
#[derive(Debug, Error)]
pub enum StorageError {
    /// A unique constraint was violated
    #[error("Duplicate entry: {message}")]
    UniqueViolation {
        message: String,
    },

    /// A foreign key constraint was violated
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation {
        message: String,
    },

    /// A check constraint was violated
    #[error("Constraint violation: {message}")]
    CheckViolation {
        message: String,
    },

    /// Connection to the database failed
    #[error("Connection error: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Beginning, committing or using a transaction failed
    #[error("Transaction error: {message}")]
    Transaction {
        message: String,
    },

    /// A statement failed for another reason
    #[error("Query failed: {message}")]
    Query {
        message: String,
    },

    /// A stored row could not be mapped back to a domain value
    #[error("Mapping error: {message}")]
    Mapping {
        message: String,
    },
}

impl StorageError {
    /// Creates a UniqueViolation error for an entity field
    pub fn unique(entity: &str, field: &str, value: impl fmt::Display) -> Self {
        StorageError::UniqueViolation {
            message: format!("{} with {} '{}' already exists", entity, field, value),
        }
    }

    /// Creates a ForeignKeyViolation error for a missing referenced row
    pub fn foreign_key(entity: &str, referenced: &str, id: impl fmt::Display) -> Self {
        StorageError::ForeignKeyViolation {
            message: format!("{} references missing {} {}", entity, referenced, id),
        }
    }

    /// Creates a Connection error
    pub fn connection(message: impl Into<String>) -> Self {
        StorageError::Connection {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a Transaction error
    pub fn transaction(message: impl Into<String>) -> Self {
        StorageError::Transaction {
            message: message.into(),
        }
    }

    /// Creates a Mapping error
    pub fn mapping(message: impl Into<String>) -> Self {
        StorageError::Mapping {
            message: message.into(),
        }
    }

    /// Returns true for unique, foreign key and check violations
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            StorageError::UniqueViolation { .. }
                | StorageError::ForeignKeyViolation { .. }
                | StorageError::CheckViolation { .. }
        )
    }
}

/// Health status for a storage backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterHealth {
    Healthy,
    Unhealthy,
}

/// Health check result for a storage backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    /// Adapter identifier
    pub adapter_id: String,
    /// Current health status
    pub status: AdapterHealth,
    /// Latency of the health check in milliseconds
    pub latency_ms: u64,
    /// Optional message with additional details
    pub message: Option<String>,
    /// Timestamp of the health check
    pub checked_at: chrono::DateTime<chrono::Utc>,
}

/// Trait for backends that support health checks
#[async_trait::async_trait]
pub trait HealthCheckable: Send + Sync {
    /// Performs a health check on the backend
    async fn health_check(&self) -> HealthCheckResult;
}
