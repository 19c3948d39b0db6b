//! Ordered payroll reconciliation
//!
//! Fall-through is decided by the `PortError` variant alone; error messages
//! are never inspected.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use core_kernel::PortError;
use crate::error::PayrollError;
use crate::model::{PayrollRecord, PayrollUpdate};
use crate::ports::PayrollStore;
use crate::strategy::{
    CandidateRecordStrategy, CreateRecordStrategy, DirectUpdateStrategy, PayrollStrategy,
    ProcedureStrategy, StrategyOutcome,
};

/// Port failures that hand over to the next strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallthroughKind {
    NotFound,
    Conflict,
    Unsupported,
}

impl FallthroughKind {
    /// Classifies a port error; `None` means the chain must stop
    pub fn classify(error: &PortError) -> Option<Self> {
        match error {
            PortError::NotFound { .. } => Some(FallthroughKind::NotFound),
            PortError::Conflict { .. } => Some(FallthroughKind::Conflict),
            PortError::Unsupported { .. } => Some(FallthroughKind::Unsupported),
            _ => None,
        }
    }
}

/// What happened when a strategy ran
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AttemptOutcome {
    Applied,
    Skipped { reason: String },
    FellThrough { kind: FallthroughKind, message: String },
    Failed { message: String },
}

/// One strategy run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attempt {
    pub strategy: String,
    #[serde(flatten)]
    pub outcome: AttemptOutcome,
}

/// Successful reconciliation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconciliation {
    /// Name of the strategy that wrote the payroll
    pub applied_by: String,
    pub record: PayrollRecord,
    /// Every attempt in order, the applying one last
    pub attempts: Vec<Attempt>,
}

/// Runs payroll strategies in order until one applies
pub struct PayrollReconciler {
    strategies: Vec<Box<dyn PayrollStrategy>>,
}

impl PayrollReconciler {
    /// The standard chain over one store
    pub fn new(store: Arc<dyn PayrollStore>) -> Self {
        Self::with_strategies(vec![
            Box::new(ProcedureStrategy::new(store.clone())),
            Box::new(DirectUpdateStrategy::new(store.clone())),
            Box::new(CreateRecordStrategy::new(store.clone())),
            Box::new(CandidateRecordStrategy::new(store)),
        ])
    }

    pub fn with_strategies(strategies: Vec<Box<dyn PayrollStrategy>>) -> Self {
        Self { strategies }
    }

    /// Strategy names in run order
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Validates `update` and writes it with the first strategy that applies
    #[instrument(skip(self, update), fields(project_id = %update.project_id, candidate_id = %update.candidate_id))]
    pub async fn reconcile(&self, update: &PayrollUpdate) -> Result<Reconciliation, PayrollError> {
        update.validate()?;
        update.total()?;

        let mut attempts = Vec::with_capacity(self.strategies.len());
        for strategy in &self.strategies {
            let name = strategy.name();
            match strategy.apply(update).await {
                Ok(StrategyOutcome::Applied(record)) => {
                    attempts.push(Attempt {
                        strategy: name.to_string(),
                        outcome: AttemptOutcome::Applied,
                    });
                    info!(
                        strategy = name,
                        attempts = attempts.len(),
                        total = %record.total,
                        "Payroll reconciled"
                    );
                    return Ok(Reconciliation {
                        applied_by: name.to_string(),
                        record,
                        attempts,
                    });
                }
                Ok(StrategyOutcome::Skipped { reason }) => {
                    debug!(strategy = name, reason, "Payroll strategy skipped");
                    attempts.push(Attempt {
                        strategy: name.to_string(),
                        outcome: AttemptOutcome::Skipped {
                            reason: reason.to_string(),
                        },
                    });
                }
                Err(error) => match FallthroughKind::classify(&error) {
                    Some(kind) => {
                        debug!(strategy = name, ?kind, error = %error, "Payroll strategy fell through");
                        attempts.push(Attempt {
                            strategy: name.to_string(),
                            outcome: AttemptOutcome::FellThrough {
                                kind,
                                message: error.to_string(),
                            },
                        });
                    }
                    None => {
                        warn!(strategy = name, error = %error, "Payroll strategy failed; stopping");
                        attempts.push(Attempt {
                            strategy: name.to_string(),
                            outcome: AttemptOutcome::Failed {
                                message: error.to_string(),
                            },
                        });
                        return Err(PayrollError::Aborted {
                            strategy: name.to_string(),
                            attempts,
                            source: error,
                        });
                    }
                },
            }
        }

        warn!(attempts = attempts.len(), "No payroll strategy applied");
        Err(PayrollError::Exhausted { attempts })
    }
}
