//! PostgreSQL payroll store
//!
//! Each `PayrollStore` method maps to one write path. Missing rows become
//! `NotFound`, a missing `upsert_staff_payroll` function becomes
//! `Unsupported` (SQLSTATE 42883), so the reconciler can move on.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::instrument;

use core_kernel::{
    CandidateId, Currency, DomainPort, Money, MoneyError, PayrollEntryId, PortError, ProjectId,
};
use domain_payroll::{PayrollRecord, PayrollStore, PayrollTarget, PayrollUpdate, WorkingDay};

use crate::error::DatabaseError;
use crate::repositories::payroll::{PayrollRepository, PayrollWrite, StaffPayrollRow};

/// PostgreSQL-backed implementation of PayrollStore
#[derive(Debug, Clone)]
pub struct PostgresPayrollStore {
    repository: PayrollRepository,
}

impl PostgresPayrollStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: PayrollRepository::new(pool),
        }
    }

    pub fn repository(&self) -> &PayrollRepository {
        &self.repository
    }
}

impl DomainPort for PostgresPayrollStore {}

#[async_trait]
impl PayrollStore for PostgresPayrollStore {
    #[instrument(skip(self, update), fields(candidate_id = %update.candidate_id))]
    async fn save_via_procedure(&self, update: &PayrollUpdate) -> Result<PayrollRecord, PortError> {
        let write = to_write(update)?;
        let entry_id = self.repository.call_upsert_procedure(&write).await?;
        let row = self.repository.get_entry(entry_id).await?;
        staff_row_to_record(row)
    }

    #[instrument(skip(self, update), fields(entry_id = %entry_id))]
    async fn update_staff_entry(
        &self,
        entry_id: PayrollEntryId,
        update: &PayrollUpdate,
    ) -> Result<PayrollRecord, PortError> {
        let write = to_write(update)?;
        match self.repository.update_entry(*entry_id.as_uuid(), &write).await? {
            Some(row) => staff_row_to_record(row),
            None => Err(PortError::not_found("ProjectStaff", entry_id)),
        }
    }

    #[instrument(skip(self, update), fields(candidate_id = %update.candidate_id))]
    async fn insert_staff_entry(&self, update: &PayrollUpdate) -> Result<PayrollRecord, PortError> {
        let write = to_write(update)?;
        let row = self
            .repository
            .insert_entry(*PayrollEntryId::new_v7().as_uuid(), &write)
            .await?;
        staff_row_to_record(row)
    }

    #[instrument(skip(self, update), fields(candidate_id = %update.candidate_id))]
    async fn update_candidate_payroll(&self, update: &PayrollUpdate) -> Result<PayrollRecord, PortError> {
        let write = to_write(update)?;
        match self.repository.update_candidate(&write).await? {
            Some(row) => {
                let mut record = PayrollRecord::from_update(update, None, PayrollTarget::Candidate)
                    .map_err(|e| PortError::validation(e.to_string()))?;
                if let Some(updated_at) = row.payroll_updated_at {
                    record.updated_at = updated_at;
                }
                Ok(record)
            }
            None => Err(PortError::not_found("Candidate", update.candidate_id)),
        }
    }
}

fn to_write(update: &PayrollUpdate) -> Result<PayrollWrite, PortError> {
    let total = update
        .total()
        .map_err(|e| PortError::validation(e.to_string()))?;
    let days = serde_json::to_value(update.sorted_days())
        .map_err(|e| DatabaseError::serialization(e.to_string()).into_port_error())?;
    Ok(PayrollWrite {
        project_id: *update.project_id.as_uuid(),
        candidate_id: *update.candidate_id.as_uuid(),
        working_days: Json(days),
        total_amount: total.amount(),
        currency: update.currency.code().to_string(),
    })
}

fn staff_row_to_record(row: StaffPayrollRow) -> Result<PayrollRecord, PortError> {
    let decode = |e: String| DatabaseError::serialization(e).into_port_error();
    let currency: Currency = row.currency.parse().map_err(|e: MoneyError| decode(e.to_string()))?;
    let working_days: Vec<WorkingDay> =
        serde_json::from_value(row.working_days.0).map_err(|e| decode(e.to_string()))?;

    Ok(PayrollRecord {
        entry_id: Some(PayrollEntryId::from(row.entry_id)),
        project_id: ProjectId::from(row.project_id),
        candidate_id: CandidateId::from(row.candidate_id),
        target: PayrollTarget::ProjectStaff,
        working_days,
        total: Money::new(row.total_amount, currency),
        updated_at: row.updated_at,
    })
}
