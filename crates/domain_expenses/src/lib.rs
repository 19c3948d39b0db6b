//! Expense Claims Domain
//!
//! This crate implements the expense claim lifecycle for crew members:
//! drafting, receipt attachment, submission, and approval or rejection by
//! an authorized approver.
//!
//! # Claim Lifecycle
//!
//! ```text
//! Draft -> Pending -> Approved
//!                  \-> Rejected
//! ```
//!
//! Approved and Rejected are terminal. Every transition is persisted as an
//! atomic check-and-set on the expected status, so concurrent approvers get
//! exactly one success and one conflict.

pub mod claim;
pub mod receipt;
pub mod summary;
pub mod authorization;
pub mod audit;
pub mod ports;
pub mod service;
pub mod error;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use claim::{
    ExpenseClaim, ClaimStatus, ClaimEvent, ClaimDetails, ClaimTransition, RejectionReason,
};
pub use receipt::{Receipt, NewReceipt};
pub use summary::{ReceiptSummary, ReceiptLine, summarize};
pub use authorization::{ActingUser, Role, ApproverDirectory, can_approve, can_view};
pub use audit::AuditEntry;
pub use ports::{ClaimsPort, AuditTrail, ClaimQuery};
pub use service::ClaimApprovalService;
pub use error::{ClaimError, ClaimErrorKind};
