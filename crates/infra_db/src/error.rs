//! Database error types
//!
//! SQLx errors are classified by PostgreSQL SQLSTATE code, never by message
//! text, and then translated to [`PortError`] at the adapter boundary.

use thiserror::Error;

use core_kernel::PortError;

/// Errors that can occur during database operations
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to establish a database connection
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Entity not found in database
    #[error("{entity} with id '{id}' not found")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation (23505)
    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    /// Foreign key constraint violation (23503)
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Check constraint violation (23514)
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Function or procedure does not exist (42883)
    #[error("Undefined function: {0}")]
    UndefinedFunction(String),

    /// Concurrent transaction could not be serialized (40001)
    #[error("Serialization failure: {0}")]
    SerializationFailure(String),

    /// Migration error
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// A stored value could not be decoded into a domain value
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Pool exhaustion - no available connections
    #[error("Connection pool exhausted")]
    PoolExhausted,
}

impl DatabaseError {
    /// Creates a not found error for a specific entity type and identifier
    ///
    /// ```rust
    /// use infra_db::DatabaseError;
    ///
    /// let error = DatabaseError::not_found("ExpenseClaim", "CLM-123");
    /// assert!(error.to_string().contains("ExpenseClaim"));
    /// ```
    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        DatabaseError::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        DatabaseError::SerializationError(message.into())
    }

    /// Checks if this error indicates a record was not found
    pub fn is_not_found(&self) -> bool {
        matches!(self, DatabaseError::NotFound { .. })
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

    /// Translates this error for the domain ports
    ///
    /// A foreign key violation means a referenced row is missing and is
    /// reported as `NotFound`; a missing function is `Unsupported`.
    pub fn into_port_error(self) -> PortError {
        match self {
            DatabaseError::NotFound { entity, id } => PortError::NotFound {
                entity_type: entity,
                id,
            },
            DatabaseError::ForeignKeyViolation(message) => PortError::NotFound {
                entity_type: "referenced row".to_string(),
                id: message,
            },
            DatabaseError::DuplicateEntry(message) | DatabaseError::SerializationFailure(message) => {
                PortError::Conflict { message }
            }
            DatabaseError::ConstraintViolation(message) => PortError::Validation {
                message,
                field: None,
            },
            DatabaseError::UndefinedFunction(operation) => PortError::Unsupported { operation },
            DatabaseError::ConnectionFailed(message) => PortError::connection(message),
            DatabaseError::PoolExhausted => PortError::ServiceUnavailable {
                service: "postgres".to_string(),
            },
            other => PortError::internal(other.to_string()),
        }
    }
}

impl From<sqlx::Error> for DatabaseError {
    fn from(error: sqlx::Error) -> Self {
        DatabaseError::from(&error)
    }
}

/// Maps SQLx errors by PostgreSQL error code
///
/// <https://www.postgresql.org/docs/current/errcodes-appendix.html>
impl From<&sqlx::Error> for DatabaseError {
    fn from(error: &sqlx::Error) -> Self {
        match error {
            sqlx::Error::RowNotFound => DatabaseError::not_found("record", "unknown"),
            sqlx::Error::PoolTimedOut => DatabaseError::PoolExhausted,
            sqlx::Error::Io(e) => DatabaseError::ConnectionFailed(e.to_string()),
            sqlx::Error::PoolClosed => DatabaseError::ConnectionFailed("pool closed".to_string()),
            sqlx::Error::Database(db_err) => {
                let message = db_err.message().to_string();
                match db_err.code().as_deref() {
                    Some("23505") => DatabaseError::DuplicateEntry(message),
                    Some("23503") => DatabaseError::ForeignKeyViolation(message),
                    Some("23514") => DatabaseError::ConstraintViolation(message),
                    Some("42883") => DatabaseError::UndefinedFunction(message),
                    Some("40001") => DatabaseError::SerializationFailure(message),
                    _ => DatabaseError::QueryFailed(message),
                }
            }
            sqlx::Error::Migrate(e) => DatabaseError::MigrationFailed(e.to_string()),
            _ => DatabaseError::QueryFailed(error.to_string()),
        }
    }
}

impl From<DatabaseError> for PortError {
    fn from(error: DatabaseError) -> Self {
        error.into_port_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_port_not_found() {
        let port = DatabaseError::not_found("ExpenseClaim", "CLM-1").into_port_error();
        assert!(port.is_not_found());
    }

    #[test]
    fn test_foreign_key_is_not_found() {
        let port = DatabaseError::ForeignKeyViolation("project_staff_candidate_id_fkey".into())
            .into_port_error();
        assert!(port.is_not_found());
    }

    #[test]
    fn test_undefined_function_is_unsupported() {
        let port = DatabaseError::UndefinedFunction("upsert_staff_payroll".into()).into_port_error();
        assert!(matches!(port, PortError::Unsupported { .. }));
    }

    #[test]
    fn test_pool_errors_are_transient() {
        assert!(DatabaseError::PoolExhausted.into_port_error().is_transient());
        assert!(DatabaseError::ConnectionFailed("refused".into())
            .into_port_error()
            .is_transient());
    }

    #[test]
    fn test_row_not_found() {
        let error = DatabaseError::from(sqlx::Error::RowNotFound);
        assert!(error.is_not_found());
    }
}
