//! Database error types
//!
//! This module defines the error types that can occur during database operations,
//! and how they are reported through the storage contract of the repository ports.

use thiserror::Error;

use core_kernel::StorageError;

/// Errors that can occur during database operations
///
/// This enum captures all possible database-related errors, including
/// connection issues, query failures, and constraint violations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to establish a database connection
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Unique constraint violation
    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    /// Foreign key constraint violation
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Check constraint violation
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Transaction error
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Migration error
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// A stored value could not be mapped to its domain type
    #[error("Mapping error: {0}")]
    MappingError(String),

    /// Pool exhaustion - no available connections
    #[error("Connection pool exhausted")]
    PoolExhausted,
}

impl DatabaseError {
    /// Creates a duplicate entry error
    ///
    /// # Arguments
    ///
    /// * `entity` - The type of entity
    /// * `field` - The field that caused the duplicate
    /// * `value` - The duplicate value
    pub fn duplicate(entity: &str, field: &str, value: impl std::fmt::Display) -> Self {
        DatabaseError::DuplicateEntry(format!(
            "{} with {} '{}' already exists",
            entity, field, value
        ))
    }

    /// Creates a transaction error
    pub fn transaction(message: impl Into<String>) -> Self {
        DatabaseError::TransactionFailed(message.into())
    }

    /// Checks if this error is a constraint violation
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            DatabaseError::DuplicateEntry(_)
                | DatabaseError::ForeignKeyViolation(_)
                | DatabaseError::ConstraintViolation(_)
        )
    }

    /// Checks if this error is a connection-related issue
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            DatabaseError::ConnectionFailed(_) | DatabaseError::PoolExhausted
        )
    }
}

/// Converts SQLx errors to more specific DatabaseError variants
///
/// This function analyzes the SQLx error and maps it to the appropriate
/// DatabaseError variant based on the PostgreSQL error code.
impl From<sqlx::Error> for DatabaseError {
    fn from(error: sqlx::Error) -> Self {
        match &error {
            sqlx::Error::PoolTimedOut => DatabaseError::PoolExhausted,
            sqlx::Error::Io(_) | sqlx::Error::Tls(_) | sqlx::Error::PoolClosed => {
                DatabaseError::ConnectionFailed(error.to_string())
            }
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) | sqlx::Error::ColumnNotFound(_) => {
                DatabaseError::MappingError(error.to_string())
            }
            sqlx::Error::Database(db_err) => {
                // PostgreSQL error codes
                // https://www.postgresql.org/docs/current/errcodes-appendix.html
                match db_err.code().as_deref() {
                    Some("23505") => DatabaseError::DuplicateEntry(db_err.message().to_string()),
                    Some("23503") => DatabaseError::ForeignKeyViolation(db_err.message().to_string()),
                    Some("23514") => DatabaseError::ConstraintViolation(db_err.message().to_string()),
                    _ => DatabaseError::QueryFailed(db_err.message().to_string()),
                }
            }
            _ => DatabaseError::QueryFailed(error.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DatabaseError {
    fn from(error: sqlx::migrate::MigrateError) -> Self {
        DatabaseError::MigrationFailed(error.to_string())
    }
}

/// Reports database failures through the repository storage contract
impl From<DatabaseError> for StorageError {
    fn from(error: DatabaseError) -> Self {
        match error {
            DatabaseError::DuplicateEntry(message) => StorageError::UniqueViolation { message },
            DatabaseError::ForeignKeyViolation(message) => StorageError::ForeignKeyViolation { message },
            DatabaseError::ConstraintViolation(message) => StorageError::CheckViolation { message },
            DatabaseError::TransactionFailed(message) => StorageError::Transaction { message },
            DatabaseError::MappingError(message) => StorageError::Mapping { message },
            DatabaseError::ConnectionFailed(_) | DatabaseError::PoolExhausted => StorageError::Connection {
                message: error.to_string(),
                source: Some(Box::new(error)),
            },
            DatabaseError::QueryFailed(message) | DatabaseError::MigrationFailed(message) => {
                StorageError::Query { message }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_maps_to_unique_violation() {
        let error: StorageError = DatabaseError::duplicate("User", "email", "a@b.io").into();
        match error {
            StorageError::UniqueViolation { message } => {
                assert_eq!(message, "User with email 'a@b.io' already exists")
            }
            other => panic!("Expected UniqueViolation, got {:?}", other),
        }
    }

    #[test]
    fn test_pool_exhaustion_is_connection_error() {
        assert!(DatabaseError::PoolExhausted.is_connection_error());
        let error: StorageError = DatabaseError::PoolExhausted.into();
        assert!(matches!(error, StorageError::Connection { .. }));
    }

    #[test]
    fn test_pool_timeout_maps_to_exhausted() {
        let error = DatabaseError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(error, DatabaseError::PoolExhausted));
    }

    #[test]
    fn test_row_not_found_is_query_failure() {
        let error = DatabaseError::from(sqlx::Error::RowNotFound);
        assert!(!error.is_constraint_violation());
        assert!(matches!(error, DatabaseError::QueryFailed(_)));
    }
}
