//! In-memory payroll store
//!
//! Mirrors the write paths of the PostgreSQL store. Failures for individual
//! operations can be injected to drive the reconciliation chain.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use core_kernel::{CandidateId, DomainPort, PayrollEntryId, PortError, ProjectId};

use crate::model::{PayrollRecord, PayrollTarget, PayrollUpdate};
use crate::ports::PayrollStore;

/// Store write paths, for failure injection and call logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    Procedure,
    UpdateStaffEntry,
    InsertStaffEntry,
    UpdateCandidate,
}

/// Injected failure kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectedFailure {
    NotFound,
    Conflict,
    Unsupported,
    Unavailable,
    Unauthorized,
}

impl InjectedFailure {
    fn to_port_error(self, op: StoreOperation) -> PortError {
        match self {
            InjectedFailure::NotFound => PortError::not_found("ProjectStaff", format!("{:?}", op)),
            InjectedFailure::Conflict => PortError::conflict(format!("{:?} hit a constraint", op)),
            InjectedFailure::Unsupported => PortError::unsupported(format!("{:?}", op)),
            InjectedFailure::Unavailable => PortError::ServiceUnavailable {
                service: "payroll store".to_string(),
            },
            InjectedFailure::Unauthorized => PortError::Unauthorized {
                message: "row level security denied the write".to_string(),
            },
        }
    }
}

/// In-memory implementation of PayrollStore
#[derive(Debug, Default)]
pub struct InMemoryPayrollStore {
    staff_entries: RwLock<HashMap<PayrollEntryId, PayrollRecord>>,
    candidate_records: RwLock<HashMap<CandidateId, PayrollRecord>>,
    failures: RwLock<HashMap<StoreOperation, InjectedFailure>>,
    calls: RwLock<Vec<StoreOperation>>,
    procedure_installed: AtomicBool,
}

impl InMemoryPayrollStore {
    /// A store without the payroll procedure
    pub fn new() -> Self {
        Self::default()
    }

    /// A store with the payroll procedure installed
    pub fn with_procedure() -> Self {
        let store = Self::default();
        store.procedure_installed.store(true, Ordering::SeqCst);
        store
    }

    /// Makes `op` fail with `failure` until cleared
    pub async fn fail_on(&self, op: StoreOperation, failure: InjectedFailure) {
        self.failures.write().await.insert(op, failure);
    }

    /// Operations called so far, in order
    pub async fn calls(&self) -> Vec<StoreOperation> {
        self.calls.read().await.clone()
    }

    /// Seeds an existing staff entry
    pub async fn seed_entry(&self, record: PayrollRecord) -> Option<PayrollEntryId> {
        let id = record.entry_id?;
        self.staff_entries.write().await.insert(id, record);
        Some(id)
    }

    pub async fn staff_entry(&self, id: PayrollEntryId) -> Option<PayrollRecord> {
        self.staff_entries.read().await.get(&id).cloned()
    }

    pub async fn candidate_record(&self, id: CandidateId) -> Option<PayrollRecord> {
        self.candidate_records.read().await.get(&id).cloned()
    }

    async fn enter(&self, op: StoreOperation) -> Result<(), PortError> {
        self.calls.write().await.push(op);
        match self.failures.read().await.get(&op) {
            Some(failure) => Err(failure.to_port_error(op)),
            None => Ok(()),
        }
    }

    async fn find_entry(&self, project_id: ProjectId, candidate_id: CandidateId) -> Option<PayrollEntryId> {
        self.staff_entries
            .read()
            .await
            .iter()
            .find(|(_, r)| r.project_id == project_id && r.candidate_id == candidate_id)
            .map(|(id, _)| *id)
    }

    async fn write_entry(&self, id: PayrollEntryId, update: &PayrollUpdate) -> Result<PayrollRecord, PortError> {
        let record = PayrollRecord::from_update(update, Some(id), PayrollTarget::ProjectStaff)
            .map_err(|e| PortError::validation(e.to_string()))?;
        self.staff_entries.write().await.insert(id, record.clone());
        Ok(record)
    }
}

impl DomainPort for InMemoryPayrollStore {}

#[async_trait]
impl PayrollStore for InMemoryPayrollStore {
    async fn save_via_procedure(&self, update: &PayrollUpdate) -> Result<PayrollRecord, PortError> {
        self.enter(StoreOperation::Procedure).await?;
        if !self.procedure_installed.load(Ordering::SeqCst) {
            return Err(PortError::unsupported("upsert_staff_payroll"));
        }
        let id = match self.find_entry(update.project_id, update.candidate_id).await {
            Some(id) => id,
            None => PayrollEntryId::new_v7(),
        };
        self.write_entry(id, update).await
    }

    async fn update_staff_entry(
        &self,
        entry_id: PayrollEntryId,
        update: &PayrollUpdate,
    ) -> Result<PayrollRecord, PortError> {
        self.enter(StoreOperation::UpdateStaffEntry).await?;
        if !self.staff_entries.read().await.contains_key(&entry_id) {
            return Err(PortError::not_found("ProjectStaff", entry_id));
        }
        self.write_entry(entry_id, update).await
    }

    async fn insert_staff_entry(&self, update: &PayrollUpdate) -> Result<PayrollRecord, PortError> {
        self.enter(StoreOperation::InsertStaffEntry).await?;
        if self.find_entry(update.project_id, update.candidate_id).await.is_some() {
            return Err(PortError::conflict(format!(
                "candidate {} already has a staff entry on project {}",
                update.candidate_id, update.project_id
            )));
        }
        self.write_entry(PayrollEntryId::new_v7(), update).await
    }

    async fn update_candidate_payroll(&self, update: &PayrollUpdate) -> Result<PayrollRecord, PortError> {
        self.enter(StoreOperation::UpdateCandidate).await?;
        let record = PayrollRecord::from_update(update, None, PayrollTarget::Candidate)
            .map_err(|e| PortError::validation(e.to_string()))?;
        self.candidate_records
            .write()
            .await
            .insert(update.candidate_id, record.clone());
        Ok(record)
    }
}
