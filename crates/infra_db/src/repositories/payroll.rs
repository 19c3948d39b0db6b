//! Project staff payroll repository
//!
//! Working days are stored as a JSONB array next to the computed total.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DatabaseError;

/// Repository for project staff payroll
#[derive(Debug, Clone)]
pub struct PayrollRepository {
    pool: PgPool,
}

impl PayrollRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Calls `upsert_staff_payroll` and returns the entry id
    ///
    /// Fails with `UndefinedFunction` where the procedure is not installed.
    pub async fn call_upsert_procedure(&self, payroll: &PayrollWrite) -> Result<Uuid, DatabaseError> {
        let entry_id = sqlx::query_scalar::<_, Uuid>(
            "SELECT upsert_staff_payroll($1, $2, $3, $4, $5)",
        )
        .bind(payroll.project_id)
        .bind(payroll.candidate_id)
        .bind(&payroll.working_days)
        .bind(payroll.total_amount)
        .bind(&payroll.currency)
        .fetch_one(&self.pool)
        .await?;
        Ok(entry_id)
    }

    pub async fn get_entry(&self, entry_id: Uuid) -> Result<StaffPayrollRow, DatabaseError> {
        sqlx::query_as::<_, StaffPayrollRow>(
            r#"
            SELECT entry_id, project_id, candidate_id, working_days, total_amount, currency, updated_at
            FROM project_staff
            WHERE entry_id = $1
            "#,
        )
        .bind(entry_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("ProjectStaff", entry_id))
    }

    /// Overwrites the payroll of an existing entry; `None` if it is missing
    pub async fn update_entry(
        &self,
        entry_id: Uuid,
        payroll: &PayrollWrite,
    ) -> Result<Option<StaffPayrollRow>, DatabaseError> {
        let row = sqlx::query_as::<_, StaffPayrollRow>(
            r#"
            UPDATE project_staff
            SET working_days = $2, total_amount = $3, currency = $4, updated_at = NOW()
            WHERE entry_id = $1
            RETURNING entry_id, project_id, candidate_id, working_days, total_amount, currency, updated_at
            "#,
        )
        .bind(entry_id)
        .bind(&payroll.working_days)
        .bind(payroll.total_amount)
        .bind(&payroll.currency)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Inserts a new staff entry
    ///
    /// A missing project or candidate surfaces as a foreign key violation and
    /// an existing entry for the pair as a duplicate.
    pub async fn insert_entry(&self, entry_id: Uuid, payroll: &PayrollWrite) -> Result<StaffPayrollRow, DatabaseError> {
        let row = sqlx::query_as::<_, StaffPayrollRow>(
            r#"
            INSERT INTO project_staff (entry_id, project_id, candidate_id, working_days, total_amount, currency, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW())
            RETURNING entry_id, project_id, candidate_id, working_days, total_amount, currency, updated_at
            "#,
        )
        .bind(entry_id)
        .bind(payroll.project_id)
        .bind(payroll.candidate_id)
        .bind(&payroll.working_days)
        .bind(payroll.total_amount)
        .bind(&payroll.currency)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Stores the payroll on the candidate record; `None` if the candidate is missing
    pub async fn update_candidate(&self, payroll: &PayrollWrite) -> Result<Option<CandidatePayrollRow>, DatabaseError> {
        let row = sqlx::query_as::<_, CandidatePayrollRow>(
            r#"
            UPDATE candidates
            SET payroll = $2,
                payroll_total = $3,
                payroll_currency = $4,
                payroll_project_id = $5,
                payroll_updated_at = NOW()
            WHERE candidate_id = $1
            RETURNING candidate_id, payroll_project_id, payroll, payroll_total, payroll_currency, payroll_updated_at
            "#,
        )
        .bind(payroll.candidate_id)
        .bind(&payroll.working_days)
        .bind(payroll.total_amount)
        .bind(&payroll.currency)
        .bind(payroll.project_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}

/// Payroll values to write
#[derive(Debug, Clone)]
pub struct PayrollWrite {
    pub project_id: Uuid,
    pub candidate_id: Uuid,
    pub working_days: Json<serde_json::Value>,
    pub total_amount: Decimal,
    pub currency: String,
}

/// Database row for a project staff entry
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StaffPayrollRow {
    pub entry_id: Uuid,
    pub project_id: Uuid,
    pub candidate_id: Uuid,
    pub working_days: Json<serde_json::Value>,
    pub total_amount: Decimal,
    pub currency: String,
    pub updated_at: DateTime<Utc>,
}

/// Payroll columns of a candidate record
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CandidatePayrollRow {
    pub candidate_id: Uuid,
    pub payroll_project_id: Option<Uuid>,
    pub payroll: Option<Json<serde_json::Value>>,
    pub payroll_total: Option<Decimal>,
    pub payroll_currency: Option<String>,
    pub payroll_updated_at: Option<DateTime<Utc>>,
}
