//! Project Staff Payroll Domain
//!
//! Working-day payroll for project staff and the reconciliation chain that
//! writes it. The backing store is not always consistent: the staff entry may
//! be missing, the stored procedure may not be installed, or the candidate
//! may only exist on the candidate table. Reconciliation therefore runs an
//! ordered list of strategies and stops at the first one that applies.
//!
//! # Strategy Order
//!
//! ```text
//! Procedure -> DirectUpdate -> CreateRecord -> CandidateRecord
//! ```
//!
//! A strategy failing with `NotFound`, `Conflict` or `Unsupported` hands over
//! to the next one; any other failure stops the chain.

pub mod model;
pub mod ports;
pub mod strategy;
pub mod reconciler;
pub mod error;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use model::{PayrollUpdate, WorkingDay, PayrollRecord, PayrollTarget};
pub use ports::PayrollStore;
pub use strategy::{
    PayrollStrategy, StrategyOutcome, ProcedureStrategy, DirectUpdateStrategy,
    CreateRecordStrategy, CandidateRecordStrategy,
};
pub use reconciler::{PayrollReconciler, Reconciliation, Attempt, AttemptOutcome, FallthroughKind};
pub use error::PayrollError;
