//! Expense claims repository implementation
//!
//! Database access for expense claims, their receipts, and the status
//! history. Status-dependent writes are single conditional statements on the
//! expected status; a `None` result means no row matched.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DatabaseError;

const CLAIM_COLUMNS: &str = r#"
    claim_id, title, description, status, total_amount, currency,
    created_by, project_id, submitted_at, approved_at, approved_by,
    rejected_at, rejected_by, rejection_reason, created_at, updated_at
"#;

const RECEIPT_COLUMNS: &str = r#"
    receipt_id, claim_id, amount, currency, receipt_date, vendor,
    description, file_ref, uploaded_at
"#;

/// Repository for expense claims
#[derive(Debug, Clone)]
pub struct ClaimsRepository {
    pool: PgPool,
}

impl ClaimsRepository {
    /// Creates a new ClaimsRepository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Retrieves a claim by its identifier
    ///
    /// # Returns
    ///
    /// The claim record or NotFound error
    pub async fn get_by_id(&self, claim_id: Uuid) -> Result<ClaimRow, DatabaseError> {
        let sql = format!("SELECT {} FROM expense_claims WHERE claim_id = $1", CLAIM_COLUMNS);
        sqlx::query_as::<_, ClaimRow>(&sql)
            .bind(claim_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::not_found("ExpenseClaim", claim_id))
    }

    /// Checks whether a claim exists
    pub async fn exists(&self, claim_id: Uuid) -> Result<bool, DatabaseError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM expense_claims WHERE claim_id = $1)",
        )
        .bind(claim_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Lists claims matching the filter, newest first
    pub async fn list(&self, filter: &ClaimFilter) -> Result<Vec<ClaimRow>, DatabaseError> {
        let sql = format!(
            r#"
            SELECT {}
            FROM expense_claims
            WHERE ($1::uuid IS NULL OR created_by = $1)
              AND ($2::claim_status IS NULL OR status = $2)
              AND ($3::uuid IS NULL OR project_id = $3)
            ORDER BY created_at DESC, claim_id DESC
            LIMIT $4 OFFSET $5
            "#,
            CLAIM_COLUMNS
        );
        let rows = sqlx::query_as::<_, ClaimRow>(&sql)
            .bind(filter.created_by)
            .bind(filter.status)
            .bind(filter.project_id)
            .bind(filter.limit.unwrap_or(100))
            .bind(filter.offset.unwrap_or(0))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Inserts a new claim
    pub async fn insert(&self, claim: &ClaimRow) -> Result<ClaimRow, DatabaseError> {
        let sql = format!(
            r#"
            INSERT INTO expense_claims (
                claim_id, title, description, status, total_amount, currency,
                created_by, project_id, submitted_at, approved_at, approved_by,
                rejected_at, rejected_by, rejection_reason, created_at, updated_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16
            )
            RETURNING {}
            "#,
            CLAIM_COLUMNS
        );
        let row = sqlx::query_as::<_, ClaimRow>(&sql)
            .bind(claim.claim_id)
            .bind(&claim.title)
            .bind(&claim.description)
            .bind(claim.status)
            .bind(claim.total_amount)
            .bind(&claim.currency)
            .bind(claim.created_by)
            .bind(claim.project_id)
            .bind(claim.submitted_at)
            .bind(claim.approved_at)
            .bind(claim.approved_by)
            .bind(claim.rejected_at)
            .bind(claim.rejected_by)
            .bind(&claim.rejection_reason)
            .bind(claim.created_at)
            .bind(claim.updated_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    /// Saves owner edits while the claim is still a draft
    ///
    /// Returns `None` when no draft with this id exists.
    pub async fn update_draft(
        &self,
        claim_id: Uuid,
        changes: &DraftChanges,
    ) -> Result<Option<ClaimRow>, DatabaseError> {
        let sql = format!(
            r#"
            UPDATE expense_claims
            SET title = $2, description = $3, total_amount = $4, project_id = $5, updated_at = NOW()
            WHERE claim_id = $1 AND status = 'draft'
            RETURNING {}
            "#,
            CLAIM_COLUMNS
        );
        let row = sqlx::query_as::<_, ClaimRow>(&sql)
            .bind(claim_id)
            .bind(&changes.title)
            .bind(&changes.description)
            .bind(changes.total_amount)
            .bind(changes.project_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Applies a status change if the stored status is still `change.from`
    ///
    /// Returns `None` when the claim is missing or its status moved.
    pub async fn transition(&self, change: &StatusChange) -> Result<Option<ClaimRow>, DatabaseError> {
        let sql = format!(
            r#"
            UPDATE expense_claims
            SET status = $3,
                submitted_at = COALESCE($4, submitted_at),
                approved_at = COALESCE($5, approved_at),
                approved_by = COALESCE($6, approved_by),
                rejected_at = COALESCE($7, rejected_at),
                rejected_by = COALESCE($8, rejected_by),
                rejection_reason = COALESCE($9, rejection_reason),
                updated_at = $10
            WHERE claim_id = $1 AND status = $2
            RETURNING {}
            "#,
            CLAIM_COLUMNS
        );
        let row = sqlx::query_as::<_, ClaimRow>(&sql)
            .bind(change.claim_id)
            .bind(change.from)
            .bind(change.to)
            .bind(change.submitted_at)
            .bind(change.approved_at)
            .bind(change.approved_by)
            .bind(change.rejected_at)
            .bind(change.rejected_by)
            .bind(&change.rejection_reason)
            .bind(change.at)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Lists the receipts of a claim by receipt date
    pub async fn list_receipts(&self, claim_id: Uuid) -> Result<Vec<ReceiptRow>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM receipts WHERE claim_id = $1 ORDER BY receipt_date, vendor",
            RECEIPT_COLUMNS
        );
        let rows = sqlx::query_as::<_, ReceiptRow>(&sql)
            .bind(claim_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Inserts a receipt while holding the claim row lock
    ///
    /// Fails with `NotFound` if the claim is missing and returns `Ok(None)`
    /// if it is no longer a draft.
    pub async fn insert_receipt(&self, receipt: &ReceiptRow) -> Result<Option<ReceiptRow>, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let status = sqlx::query_scalar::<_, ClaimStatus>(
            "SELECT status FROM expense_claims WHERE claim_id = $1 FOR UPDATE",
        )
        .bind(receipt.claim_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DatabaseError::not_found("ExpenseClaim", receipt.claim_id))?;

        if status != ClaimStatus::Draft {
            tx.rollback().await?;
            return Ok(None);
        }

        let sql = format!(
            r#"
            INSERT INTO receipts (
                receipt_id, claim_id, amount, currency, receipt_date, vendor,
                description, file_ref, uploaded_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            RECEIPT_COLUMNS
        );
        let row = sqlx::query_as::<_, ReceiptRow>(&sql)
            .bind(receipt.receipt_id)
            .bind(receipt.claim_id)
            .bind(receipt.amount)
            .bind(&receipt.currency)
            .bind(receipt.receipt_date)
            .bind(&receipt.vendor)
            .bind(&receipt.description)
            .bind(&receipt.file_ref)
            .bind(receipt.uploaded_at)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(row))
    }

    /// Appends a status history entry
    pub async fn record_history(&self, entry: &StatusHistoryRow) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO claim_status_history (
                event_id, claim_id, from_status, to_status, actor, reason, recorded_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(entry.event_id)
        .bind(entry.claim_id)
        .bind(entry.from_status)
        .bind(entry.to_status)
        .bind(entry.actor)
        .bind(&entry.reason)
        .bind(entry.recorded_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Returns the status history of a claim, oldest first
    pub async fn history(&self, claim_id: Uuid) -> Result<Vec<StatusHistoryRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, StatusHistoryRow>(
            r#"
            SELECT event_id, claim_id, from_status, to_status, actor, reason, recorded_at
            FROM claim_status_history
            WHERE claim_id = $1
            ORDER BY recorded_at, event_id
            "#,
        )
        .bind(claim_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

/// Claim status enum matching database type
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "claim_status", rename_all = "snake_case")]
pub enum ClaimStatus {
    Draft,
    Pending,
    Approved,
    Rejected,
}

/// Database row for an expense claim
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ClaimRow {
    pub claim_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: ClaimStatus,
    pub total_amount: Decimal,
    pub currency: String,
    pub created_by: Uuid,
    pub project_id: Option<Uuid>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub approved_at: Option<DateTime<Utc>>,
    pub approved_by: Option<Uuid>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub rejected_by: Option<Uuid>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Filter for listing claims
#[derive(Debug, Clone, Default)]
pub struct ClaimFilter {
    pub created_by: Option<Uuid>,
    pub status: Option<ClaimStatus>,
    pub project_id: Option<Uuid>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Owner-editable columns
#[derive(Debug, Clone)]
pub struct DraftChanges {
    pub title: String,
    pub description: Option<String>,
    pub total_amount: Decimal,
    pub project_id: Option<Uuid>,
}

/// A conditional status update
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub claim_id: Uuid,
    pub from: ClaimStatus,
    pub to: ClaimStatus,
    pub at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub approved_at: Option<DateTime<Utc>>,
    pub approved_by: Option<Uuid>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub rejected_by: Option<Uuid>,
    pub rejection_reason: Option<String>,
}

/// Database row for a receipt
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReceiptRow {
    pub receipt_id: Uuid,
    pub claim_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub receipt_date: NaiveDate,
    pub vendor: String,
    pub description: Option<String>,
    pub file_ref: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

/// Database row for a status history entry
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StatusHistoryRow {
    pub event_id: Uuid,
    pub claim_id: Uuid,
    pub from_status: ClaimStatus,
    pub to_status: ClaimStatus,
    pub actor: Uuid,
    pub reason: Option<String>,
    pub recorded_at: DateTime<Utc>,
}
