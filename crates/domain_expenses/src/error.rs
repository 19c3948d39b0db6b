//! Expense claims domain errors

use core_kernel::{MoneyError, PortError};
use thiserror::Error;

/// Errors that can occur in the expense claims domain
#[derive(Debug, Error)]
pub enum ClaimError {
    /// Input rejected before any persistence call
    #[error("Validation error: {0}")]
    Validation(String),

    /// The acting user may not perform the operation
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The claim was not in the expected state at write time
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid status transition: {event} is not allowed from {from}")]
    InvalidStatusTransition { from: String, event: String },

    #[error("Money error: {0}")]
    Money(#[from] MoneyError),

    /// Network or database failure; not retried
    #[error("Storage unavailable: {0}")]
    Transient(String),

    /// Storage failure that retrying will not fix, e.g. an undecodable row
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification of [`ClaimError`] for callers that map errors to
/// user-visible outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimErrorKind {
    Validation,
    Authorization,
    Conflict,
    NotFound,
    Transient,
    Internal,
}

impl ClaimError {
    pub fn validation(message: impl Into<String>) -> Self {
        ClaimError::Validation(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ClaimError::Unauthorized(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ClaimError::Conflict(message.into())
    }

    /// Returns the error kind
    pub fn kind(&self) -> ClaimErrorKind {
        match self {
            ClaimError::Validation(_) | ClaimError::Money(_) => ClaimErrorKind::Validation,
            ClaimError::Unauthorized(_) => ClaimErrorKind::Authorization,
            ClaimError::Conflict(_) | ClaimError::InvalidStatusTransition { .. } => {
                ClaimErrorKind::Conflict
            }
            ClaimError::NotFound(_) => ClaimErrorKind::NotFound,
            ClaimError::Transient(_) => ClaimErrorKind::Transient,
            ClaimError::Internal(_) => ClaimErrorKind::Internal,
        }
    }

    pub fn is_conflict(&self) -> bool {
        self.kind() == ClaimErrorKind::Conflict
    }
}

impl From<PortError> for ClaimError {
    fn from(error: PortError) -> Self {
        match error {
            PortError::NotFound { entity_type, id } => {
                ClaimError::NotFound(format!("{} {}", entity_type, id))
            }
            PortError::Validation { message, .. } => ClaimError::Validation(message),
            PortError::Conflict { message } => ClaimError::Conflict(message),
            PortError::Unauthorized { message } => ClaimError::Unauthorized(message),
            other if other.is_transient() => ClaimError::Transient(other.to_string()),
            other => ClaimError::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_errors_map_to_kinds() {
        let not_found: ClaimError = PortError::not_found("ExpenseClaim", "CLM-1").into();
        assert_eq!(not_found.kind(), ClaimErrorKind::NotFound);

        let conflict: ClaimError = PortError::conflict("status moved").into();
        assert_eq!(conflict.kind(), ClaimErrorKind::Conflict);

        let transient: ClaimError = PortError::connection("reset by peer").into();
        assert_eq!(transient.kind(), ClaimErrorKind::Transient);

        let timeout: ClaimError = PortError::Timeout {
            operation: "transition_claim".to_string(),
            duration_ms: 5_000,
        }
        .into();
        assert_eq!(timeout.kind(), ClaimErrorKind::Transient);
    }

    #[test]
    fn test_non_retryable_port_errors_are_internal() {
        let corrupt: ClaimError = PortError::internal("unknown currency XYZ in expense_claims").into();
        assert_eq!(corrupt.kind(), ClaimErrorKind::Internal);

        let unsupported: ClaimError = PortError::unsupported("rpc").into();
        assert_eq!(unsupported.kind(), ClaimErrorKind::Internal);
    }

    #[test]
    fn test_invalid_transition_is_a_conflict() {
        let error = ClaimError::InvalidStatusTransition {
            from: "approved".to_string(),
            event: "approve".to_string(),
        };
        assert!(error.is_conflict());
        assert_eq!(
            error.to_string(),
            "Invalid status transition: approve is not allowed from approved"
        );
    }
}
