//! Payroll write strategies

use std::sync::Arc;

use async_trait::async_trait;

use core_kernel::PortError;
use crate::model::{PayrollRecord, PayrollUpdate};
use crate::ports::PayrollStore;

/// Result of a strategy that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrategyOutcome {
    /// The payroll was written
    Applied(PayrollRecord),
    /// The strategy does not apply to this update
    Skipped { reason: &'static str },
}

/// One way of writing a payroll update
#[async_trait]
pub trait PayrollStrategy: Send + Sync {
    /// Stable name used in logs and attempt reports
    fn name(&self) -> &'static str;

    async fn apply(&self, update: &PayrollUpdate) -> Result<StrategyOutcome, PortError>;
}

/// Calls the store's payroll procedure
pub struct ProcedureStrategy {
    store: Arc<dyn PayrollStore>,
}

impl ProcedureStrategy {
    pub fn new(store: Arc<dyn PayrollStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl PayrollStrategy for ProcedureStrategy {
    fn name(&self) -> &'static str {
        "procedure"
    }

    async fn apply(&self, update: &PayrollUpdate) -> Result<StrategyOutcome, PortError> {
        self.store
            .save_via_procedure(update)
            .await
            .map(StrategyOutcome::Applied)
    }
}

/// Updates the known project staff entry
pub struct DirectUpdateStrategy {
    store: Arc<dyn PayrollStore>,
}

impl DirectUpdateStrategy {
    pub fn new(store: Arc<dyn PayrollStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl PayrollStrategy for DirectUpdateStrategy {
    fn name(&self) -> &'static str {
        "direct_update"
    }

    async fn apply(&self, update: &PayrollUpdate) -> Result<StrategyOutcome, PortError> {
        let Some(entry_id) = update.staff_entry_id else {
            return Ok(StrategyOutcome::Skipped {
                reason: "no staff entry id",
            });
        };
        self.store
            .update_staff_entry(entry_id, update)
            .await
            .map(StrategyOutcome::Applied)
    }
}

/// Creates the project staff entry
pub struct CreateRecordStrategy {
    store: Arc<dyn PayrollStore>,
}

impl CreateRecordStrategy {
    pub fn new(store: Arc<dyn PayrollStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl PayrollStrategy for CreateRecordStrategy {
    fn name(&self) -> &'static str {
        "create_record"
    }

    async fn apply(&self, update: &PayrollUpdate) -> Result<StrategyOutcome, PortError> {
        self.store
            .insert_staff_entry(update)
            .await
            .map(StrategyOutcome::Applied)
    }
}

/// Writes onto the candidate record as a last resort
pub struct CandidateRecordStrategy {
    store: Arc<dyn PayrollStore>,
}

impl CandidateRecordStrategy {
    pub fn new(store: Arc<dyn PayrollStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl PayrollStrategy for CandidateRecordStrategy {
    fn name(&self) -> &'static str {
        "candidate_record"
    }

    async fn apply(&self, update: &PayrollUpdate) -> Result<StrategyOutcome, PortError> {
        self.store
            .update_candidate_payroll(update)
            .await
            .map(StrategyOutcome::Applied)
    }
}
