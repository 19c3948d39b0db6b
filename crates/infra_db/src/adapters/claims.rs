//! PostgreSQL Claims Adapter
//!
//! Implements `ClaimsPort` and `AuditTrail` over [`ClaimsRepository`].
//!
//! A conditional write that matches no row is resolved with a follow-up
//! existence check: a missing claim is `NotFound`, anything else means the
//! status moved and is reported as `Conflict`.
//!
//! ```rust,ignore
//! use infra_db::adapters::PostgresClaimsAdapter;
//! use domain_expenses::ClaimsPort;
//!
//! let adapter = PostgresClaimsAdapter::new(pool);
//! let claim = adapter.get_claim(claim_id, None).await?;
//! ```

use std::str::FromStr;

use async_trait::async_trait;
use tracing::{debug, instrument};

use core_kernel::{
    AdapterHealth, AuditEventId, ClaimId, Currency, DomainPort, HealthCheckResult,
    HealthCheckable, Money, OperationMetadata, PortError, ProjectId, ReceiptId, UserId,
};
use domain_expenses::{
    AuditEntry, AuditTrail, ClaimQuery, ClaimStatus, ClaimTransition, ClaimsPort, ExpenseClaim,
    Receipt,
};

use crate::error::DatabaseError;
use crate::repositories::claims::{
    ClaimFilter, ClaimRow, ClaimStatus as DbClaimStatus, ClaimsRepository, DraftChanges,
    ReceiptRow, StatusChange, StatusHistoryRow,
};

/// PostgreSQL-backed implementation of the claims ports
#[derive(Debug, Clone)]
pub struct PostgresClaimsAdapter {
    repository: ClaimsRepository,
    pool: sqlx::PgPool,
}

impl PostgresClaimsAdapter {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self {
            repository: ClaimsRepository::new(pool.clone()),
            pool,
        }
    }

    /// Returns a reference to the underlying repository
    pub fn repository(&self) -> &ClaimsRepository {
        &self.repository
    }

    /// Status history of a claim, oldest first
    pub async fn history(&self, claim_id: ClaimId) -> Result<Vec<AuditEntry>, PortError> {
        let rows = self.repository.history(*claim_id.as_uuid()).await?;
        Ok(rows.into_iter().map(row_to_audit_entry).collect())
    }

    /// Decides between NotFound and Conflict after a conditional write missed
    async fn missed_write(&self, claim_id: ClaimId, expected: &str) -> PortError {
        match self.repository.exists(*claim_id.as_uuid()).await {
            Ok(false) => PortError::not_found("ExpenseClaim", claim_id),
            Ok(true) => PortError::conflict(format!(
                "claim {} is no longer {}",
                claim_id, expected
            )),
            Err(e) => e.into_port_error(),
        }
    }
}

impl DomainPort for PostgresClaimsAdapter {}

#[async_trait]
impl HealthCheckable for PostgresClaimsAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        let start = std::time::Instant::now();
        let result = crate::pool::ping(&self.pool).await;
        let latency_ms = start.elapsed().as_millis() as u64;

        let mut health = HealthCheckResult::healthy("postgres-claims-adapter");
        health.latency_ms = latency_ms;
        if let Err(e) = result {
            health.status = AdapterHealth::Unhealthy;
            health.message = Some(format!("Database error: {}", e));
        }
        health
    }
}

#[async_trait]
impl ClaimsPort for PostgresClaimsAdapter {
    #[instrument(skip(self, _metadata), fields(claim_id = %id))]
    async fn get_claim(
        &self,
        id: ClaimId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<ExpenseClaim, PortError> {
        let row = self.repository.get_by_id(*id.as_uuid()).await?;
        row_to_claim(row)
    }

    #[instrument(skip(self, _metadata))]
    async fn list_claims(
        &self,
        query: ClaimQuery,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Vec<ExpenseClaim>, PortError> {
        let filter = ClaimFilter {
            created_by: query.created_by.map(Into::into),
            status: query.status.map(status_to_db),
            project_id: query.project_id.map(Into::into),
            limit: query.limit.map(i64::from),
            offset: query.offset.map(i64::from),
        };
        let rows = self.repository.list(&filter).await?;
        debug!(count = rows.len(), "Listed claims");
        rows.into_iter().map(row_to_claim).collect()
    }

    #[instrument(skip(self, claim, _metadata), fields(claim_id = %claim.id))]
    async fn create_claim(
        &self,
        claim: &ExpenseClaim,
        _metadata: Option<OperationMetadata>,
    ) -> Result<ExpenseClaim, PortError> {
        let row = self.repository.insert(&claim_to_row(claim)).await?;
        row_to_claim(row)
    }

    #[instrument(skip(self, claim, _metadata), fields(claim_id = %claim.id))]
    async fn update_draft(
        &self,
        claim: &ExpenseClaim,
        _metadata: Option<OperationMetadata>,
    ) -> Result<ExpenseClaim, PortError> {
        let changes = DraftChanges {
            title: claim.title.clone(),
            description: claim.description.clone(),
            total_amount: claim.total_amount.amount(),
            project_id: claim.project_id.map(Into::into),
        };
        match self.repository.update_draft(*claim.id.as_uuid(), &changes).await? {
            Some(row) => row_to_claim(row),
            None => Err(self.missed_write(claim.id, "a draft").await),
        }
    }

    #[instrument(
        skip(self, transition, _metadata),
        fields(claim_id = %transition.claim_id, from = %transition.from, to = %transition.to)
    )]
    async fn transition_claim(
        &self,
        transition: &ClaimTransition,
        _metadata: Option<OperationMetadata>,
    ) -> Result<ExpenseClaim, PortError> {
        let change = transition_to_change(transition);
        match self.repository.transition(&change).await? {
            Some(row) => row_to_claim(row),
            None => Err(self.missed_write(transition.claim_id, transition.from.as_str()).await),
        }
    }

    async fn list_receipts(
        &self,
        claim_id: ClaimId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Vec<Receipt>, PortError> {
        let rows = self.repository.list_receipts(*claim_id.as_uuid()).await?;
        if rows.is_empty() && !self.repository.exists(*claim_id.as_uuid()).await? {
            return Err(PortError::not_found("ExpenseClaim", claim_id));
        }
        rows.into_iter().map(row_to_receipt).collect()
    }

    #[instrument(skip(self, receipt, _metadata), fields(claim_id = %receipt.claim_id))]
    async fn attach_receipt(
        &self,
        receipt: &Receipt,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Receipt, PortError> {
        match self.repository.insert_receipt(&receipt_to_row(receipt)).await? {
            Some(row) => row_to_receipt(row),
            None => Err(PortError::conflict(format!(
                "claim {} is no longer a draft",
                receipt.claim_id
            ))),
        }
    }
}

#[async_trait]
impl AuditTrail for PostgresClaimsAdapter {
    async fn record(&self, entry: &AuditEntry) -> Result<(), PortError> {
        let row = StatusHistoryRow {
            event_id: *entry.id.as_uuid(),
            claim_id: *entry.claim_id.as_uuid(),
            from_status: status_to_db(entry.from_status),
            to_status: status_to_db(entry.to_status),
            actor: *entry.actor.as_uuid(),
            reason: entry.reason.clone(),
            recorded_at: entry.recorded_at,
        };
        Ok(self.repository.record_history(&row).await?)
    }
}

// ============================================================================
// Row conversions
// ============================================================================

fn status_to_db(status: ClaimStatus) -> DbClaimStatus {
    match status {
        ClaimStatus::Draft => DbClaimStatus::Draft,
        ClaimStatus::Pending => DbClaimStatus::Pending,
        ClaimStatus::Approved => DbClaimStatus::Approved,
        ClaimStatus::Rejected => DbClaimStatus::Rejected,
    }
}

fn status_from_db(status: DbClaimStatus) -> ClaimStatus {
    match status {
        DbClaimStatus::Draft => ClaimStatus::Draft,
        DbClaimStatus::Pending => ClaimStatus::Pending,
        DbClaimStatus::Approved => ClaimStatus::Approved,
        DbClaimStatus::Rejected => ClaimStatus::Rejected,
    }
}

fn parse_currency(code: &str) -> Result<Currency, PortError> {
    Currency::from_str(code)
        .map_err(|e| DatabaseError::serialization(e.to_string()).into_port_error())
}

fn row_to_claim(row: ClaimRow) -> Result<ExpenseClaim, PortError> {
    let currency = parse_currency(&row.currency)?;
    Ok(ExpenseClaim {
        id: ClaimId::from(row.claim_id),
        title: row.title,
        description: row.description,
        status: status_from_db(row.status),
        total_amount: Money::new(row.total_amount, currency),
        created_by: UserId::from(row.created_by),
        project_id: row.project_id.map(ProjectId::from),
        submitted_at: row.submitted_at,
        approved_at: row.approved_at,
        approved_by: row.approved_by.map(UserId::from),
        rejected_at: row.rejected_at,
        rejected_by: row.rejected_by.map(UserId::from),
        rejection_reason: row.rejection_reason,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn claim_to_row(claim: &ExpenseClaim) -> ClaimRow {
    ClaimRow {
        claim_id: *claim.id.as_uuid(),
        title: claim.title.clone(),
        description: claim.description.clone(),
        status: status_to_db(claim.status),
        total_amount: claim.total_amount.amount(),
        currency: claim.currency().code().to_string(),
        created_by: *claim.created_by.as_uuid(),
        project_id: claim.project_id.map(Into::into),
        submitted_at: claim.submitted_at,
        approved_at: claim.approved_at,
        approved_by: claim.approved_by.map(Into::into),
        rejected_at: claim.rejected_at,
        rejected_by: claim.rejected_by.map(Into::into),
        rejection_reason: claim.rejection_reason.clone(),
        created_at: claim.created_at,
        updated_at: claim.updated_at,
    }
}

fn transition_to_change(transition: &ClaimTransition) -> StatusChange {
    let actor = *transition.actor.as_uuid();
    let mut change = StatusChange {
        claim_id: *transition.claim_id.as_uuid(),
        from: status_to_db(transition.from),
        to: status_to_db(transition.to),
        at: transition.at,
        submitted_at: None,
        approved_at: None,
        approved_by: None,
        rejected_at: None,
        rejected_by: None,
        rejection_reason: None,
    };
    match transition.to {
        ClaimStatus::Pending => change.submitted_at = Some(transition.at),
        ClaimStatus::Approved => {
            change.approved_at = Some(transition.at);
            change.approved_by = Some(actor);
        }
        ClaimStatus::Rejected => {
            change.rejected_at = Some(transition.at);
            change.rejected_by = Some(actor);
            change.rejection_reason = transition.reason.as_ref().map(|r| r.to_string());
        }
        ClaimStatus::Draft => {}
    }
    change
}

fn row_to_receipt(row: ReceiptRow) -> Result<Receipt, PortError> {
    let currency = parse_currency(&row.currency)?;
    Ok(Receipt {
        id: ReceiptId::from(row.receipt_id),
        claim_id: ClaimId::from(row.claim_id),
        amount: Money::new(row.amount, currency),
        receipt_date: row.receipt_date,
        vendor: row.vendor,
        description: row.description,
        file_ref: row.file_ref,
        uploaded_at: row.uploaded_at,
    })
}

fn receipt_to_row(receipt: &Receipt) -> ReceiptRow {
    ReceiptRow {
        receipt_id: *receipt.id.as_uuid(),
        claim_id: *receipt.claim_id.as_uuid(),
        amount: receipt.amount.amount(),
        currency: receipt.amount.currency().code().to_string(),
        receipt_date: receipt.receipt_date,
        vendor: receipt.vendor.clone(),
        description: receipt.description.clone(),
        file_ref: receipt.file_ref.clone(),
        uploaded_at: receipt.uploaded_at,
    }
}

fn row_to_audit_entry(row: StatusHistoryRow) -> AuditEntry {
    AuditEntry {
        id: AuditEventId::from(row.event_id),
        claim_id: ClaimId::from(row.claim_id),
        from_status: status_from_db(row.from_status),
        to_status: status_from_db(row.to_status),
        actor: UserId::from(row.actor),
        reason: row.reason,
        recorded_at: row.recorded_at,
    }
}
