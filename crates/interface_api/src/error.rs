//! API error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use domain_expenses::{ClaimError, ClaimErrorKind};
use domain_payroll::{Attempt, PayrollError};

use crate::auth::AuthError;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// No payroll strategy applied; the attempts are returned to the caller
    #[error("Payroll not reconciled: {message}")]
    PayrollNotApplied { message: String, attempts: Vec<Attempt> },
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message, details) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", "Unauthorized".to_string(), None),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg, None),
            ApiError::Internal(msg) => {
                error!(error = %msg, "Internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg, None)
            }
            ApiError::ServiceUnavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable", msg, None)
            }
            ApiError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error", msg, None),
            ApiError::PayrollNotApplied { message, attempts } => {
                let details = attempts
                    .iter()
                    .map(|a| format!("{}: {:?}", a.strategy, a.outcome))
                    .collect();
                (StatusCode::CONFLICT, "payroll_not_applied", message, Some(details))
            }
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<ClaimError> for ApiError {
    fn from(err: ClaimError) -> Self {
        let message = err.to_string();
        match err.kind() {
            ClaimErrorKind::Validation => ApiError::Validation(message),
            ClaimErrorKind::Authorization => ApiError::Forbidden(message),
            ClaimErrorKind::Conflict => ApiError::Conflict(message),
            ClaimErrorKind::NotFound => ApiError::NotFound(message),
            ClaimErrorKind::Transient => ApiError::ServiceUnavailable(message),
            ClaimErrorKind::Internal => ApiError::Internal(message),
        }
    }
}

impl From<PayrollError> for ApiError {
    fn from(err: PayrollError) -> Self {
        let message = err.to_string();
        match err {
            PayrollError::Validation(_) | PayrollError::Money(_) => ApiError::Validation(message),
            PayrollError::Exhausted { attempts } => ApiError::PayrollNotApplied { message, attempts },
            PayrollError::Aborted { ref source, .. } if source.is_transient() => {
                ApiError::ServiceUnavailable(message)
            }
            PayrollError::Aborted { .. } => ApiError::Internal(message),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingRole(_) => ApiError::Forbidden(err.to_string()),
            AuthError::InvalidToken | AuthError::TokenExpired | AuthError::InvalidSubject(_) => {
                ApiError::Unauthorized
            }
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        ApiError::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::PortError;

    fn status_of(err: impl Into<ApiError>) -> StatusCode {
        err.into().into_response().status()
    }

    #[test]
    fn test_claim_errors_map_to_statuses() {
        assert_eq!(status_of(ClaimError::validation("reason required")), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(status_of(ClaimError::unauthorized("not an approver")), StatusCode::FORBIDDEN);
        assert_eq!(status_of(ClaimError::conflict("already approved")), StatusCode::CONFLICT);
        assert_eq!(status_of(ClaimError::NotFound("claim".into())), StatusCode::NOT_FOUND);
        assert_eq!(status_of(ClaimError::Transient("timeout".into())), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            status_of(ClaimError::from(PortError::internal("unknown currency XYZ"))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_payroll_errors_map_to_statuses() {
        assert_eq!(status_of(PayrollError::validation("no days")), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(status_of(PayrollError::Exhausted { attempts: vec![] }), StatusCode::CONFLICT);

        let transient = PayrollError::Aborted {
            strategy: "procedure".into(),
            attempts: vec![],
            source: PortError::connection("reset"),
        };
        assert_eq!(status_of(transient), StatusCode::SERVICE_UNAVAILABLE);

        let denied = PayrollError::Aborted {
            strategy: "procedure".into(),
            attempts: vec![],
            source: PortError::Unauthorized { message: "rls".into() },
        };
        assert_eq!(status_of(denied), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_auth_errors_map_to_statuses() {
        assert_eq!(status_of(AuthError::TokenExpired), StatusCode::UNAUTHORIZED);
        assert_eq!(
            status_of(AuthError::MissingRole(domain_expenses::Role::Admin)),
            StatusCode::FORBIDDEN
        );
    }
}
