//! Payroll domain errors

use thiserror::Error;

use core_kernel::{MoneyError, PortError};
use crate::reconciler::Attempt;

/// Errors from payroll reconciliation
#[derive(Debug, Error)]
pub enum PayrollError {
    #[error("Invalid payroll update: {0}")]
    Validation(String),

    #[error("Money error: {0}")]
    Money(#[from] MoneyError),

    /// Every strategy was tried and none applied
    #[error("No payroll strategy applied after {} attempts", .attempts.len())]
    Exhausted { attempts: Vec<Attempt> },

    /// A strategy failed in a way that must not fall through
    #[error("Payroll strategy {strategy} failed: {source}")]
    Aborted {
        strategy: String,
        attempts: Vec<Attempt>,
        #[source]
        source: PortError,
    },
}

impl PayrollError {
    pub fn validation(message: impl Into<String>) -> Self {
        PayrollError::Validation(message.into())
    }

    /// Whether retrying later may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            PayrollError::Aborted { source, .. } => source.is_transient(),
            _ => false,
        }
    }

    /// Attempts made before the error, if any strategy ran
    pub fn attempts(&self) -> &[Attempt] {
        match self {
            PayrollError::Exhausted { attempts } | PayrollError::Aborted { attempts, .. } => attempts,
            _ => &[],
        }
    }
}
