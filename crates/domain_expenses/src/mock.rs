//! In-memory port implementations
//!
//! These adapters keep state in memory and are used by unit tests here and
//! by the API tests without a database. Conditional writes happen under a
//! single write lock, so they are as atomic as the PostgreSQL ones.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use core_kernel::{
    AdapterHealth, ClaimId, DomainPort, HealthCheckResult, HealthCheckable, OperationMetadata,
    PortError, UserId,
};

use crate::audit::AuditEntry;
use crate::authorization::ApproverDirectory;
use crate::claim::{ClaimStatus, ClaimTransition, ExpenseClaim};
use crate::ports::{AuditTrail, ClaimQuery, ClaimsPort};
use crate::receipt::Receipt;

/// In-memory mock implementation of ClaimsPort
#[derive(Debug, Default)]
pub struct InMemoryClaimsPort {
    claims: Arc<RwLock<HashMap<ClaimId, ExpenseClaim>>>,
    receipts: Arc<RwLock<HashMap<ClaimId, Vec<Receipt>>>>,
    unavailable: AtomicBool,
    calls: AtomicUsize,
}

impl InMemoryClaimsPort {
    /// Creates an empty port
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populates with claims for testing
    pub async fn with_claims(claims: Vec<ExpenseClaim>) -> Self {
        let port = Self::new();
        {
            let mut stored = port.claims.write().await;
            for claim in claims {
                stored.insert(claim.id, claim);
            }
        }
        port
    }

    /// Makes every call fail with `ServiceUnavailable`
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of port calls made so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn enter(&self) -> Result<(), PortError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(PortError::ServiceUnavailable {
                service: "in-memory claims store".to_string(),
            });
        }
        Ok(())
    }
}

impl DomainPort for InMemoryClaimsPort {}

#[async_trait]
impl HealthCheckable for InMemoryClaimsPort {
    async fn health_check(&self) -> HealthCheckResult {
        let mut result = HealthCheckResult::healthy("in-memory-claims");
        if self.unavailable.load(Ordering::SeqCst) {
            result.status = AdapterHealth::Unhealthy;
            result.message = Some("marked unavailable".to_string());
        }
        result
    }
}

#[async_trait]
impl ClaimsPort for InMemoryClaimsPort {
    async fn get_claim(
        &self,
        id: ClaimId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<ExpenseClaim, PortError> {
        self.enter()?;
        self.claims
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::not_found("ExpenseClaim", id))
    }

    async fn list_claims(
        &self,
        query: ClaimQuery,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Vec<ExpenseClaim>, PortError> {
        self.enter()?;
        let claims = self.claims.read().await;
        let mut results: Vec<_> = claims.values().filter(|c| query.matches(c)).cloned().collect();
        results.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.as_uuid().cmp(a.id.as_uuid()))
        });

        let offset = query.offset.unwrap_or(0) as usize;
        let limit = query.limit.map(|l| l as usize).unwrap_or(usize::MAX);
        Ok(results.into_iter().skip(offset).take(limit).collect())
    }

    async fn create_claim(
        &self,
        claim: &ExpenseClaim,
        _metadata: Option<OperationMetadata>,
    ) -> Result<ExpenseClaim, PortError> {
        self.enter()?;
        let mut claims = self.claims.write().await;
        if claims.contains_key(&claim.id) {
            return Err(PortError::conflict(format!("claim {} already exists", claim.id)));
        }
        claims.insert(claim.id, claim.clone());
        Ok(claim.clone())
    }

    async fn update_draft(
        &self,
        claim: &ExpenseClaim,
        _metadata: Option<OperationMetadata>,
    ) -> Result<ExpenseClaim, PortError> {
        self.enter()?;
        let mut claims = self.claims.write().await;
        let stored = claims
            .get_mut(&claim.id)
            .ok_or_else(|| PortError::not_found("ExpenseClaim", claim.id))?;
        if stored.status != ClaimStatus::Draft {
            return Err(PortError::conflict(format!(
                "claim {} is {} and can no longer be edited",
                claim.id, stored.status
            )));
        }

        stored.title = claim.title.clone();
        stored.description = claim.description.clone();
        stored.total_amount = claim.total_amount;
        stored.project_id = claim.project_id;
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn transition_claim(
        &self,
        transition: &ClaimTransition,
        _metadata: Option<OperationMetadata>,
    ) -> Result<ExpenseClaim, PortError> {
        self.enter()?;
        let mut claims = self.claims.write().await;
        let stored = claims
            .get_mut(&transition.claim_id)
            .ok_or_else(|| PortError::not_found("ExpenseClaim", transition.claim_id))?;
        if stored.status != transition.from {
            return Err(PortError::conflict(format!(
                "claim {} is {}, expected {}",
                transition.claim_id, stored.status, transition.from
            )));
        }

        stored.record_transition(transition);
        Ok(stored.clone())
    }

    async fn list_receipts(
        &self,
        claim_id: ClaimId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Vec<Receipt>, PortError> {
        self.enter()?;
        if !self.claims.read().await.contains_key(&claim_id) {
            return Err(PortError::not_found("ExpenseClaim", claim_id));
        }
        let receipts = self.receipts.read().await;
        Ok(receipts.get(&claim_id).cloned().unwrap_or_default())
    }

    async fn attach_receipt(
        &self,
        receipt: &Receipt,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Receipt, PortError> {
        self.enter()?;
        let claims = self.claims.read().await;
        let claim = claims
            .get(&receipt.claim_id)
            .ok_or_else(|| PortError::not_found("ExpenseClaim", receipt.claim_id))?;
        if claim.status != ClaimStatus::Draft {
            return Err(PortError::conflict(format!(
                "claim {} is {}; receipts can only be attached to drafts",
                claim.id, claim.status
            )));
        }

        self.receipts
            .write()
            .await
            .entry(receipt.claim_id)
            .or_default()
            .push(receipt.clone());
        Ok(receipt.clone())
    }
}

/// Approver relationships held in memory
#[derive(Debug, Default)]
pub struct StaticApproverDirectory {
    grants: RwLock<HashSet<(UserId, UserId)>>,
    failing: AtomicBool,
}

impl StaticApproverDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lets `approver` decide on claims owned by `target`
    pub async fn grant(&self, approver: UserId, target: UserId) {
        self.grants.write().await.insert((approver, target));
    }

    /// Makes every lookup fail
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl DomainPort for StaticApproverDirectory {}

#[async_trait]
impl ApproverDirectory for StaticApproverDirectory {
    async fn is_approver(&self, approver: UserId, target: UserId) -> Result<bool, PortError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PortError::Timeout {
                operation: "approver lookup".to_string(),
                duration_ms: 5_000,
            });
        }
        Ok(self.grants.read().await.contains(&(approver, target)))
    }
}

/// Audit trail that keeps entries in memory
#[derive(Debug, Default)]
pub struct RecordingAuditTrail {
    entries: RwLock<Vec<AuditEntry>>,
    failing: AtomicBool,
}

impl RecordingAuditTrail {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries recorded so far, oldest first
    pub async fn entries(&self) -> Vec<AuditEntry> {
        self.entries.read().await.clone()
    }

    /// Makes every write fail
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl DomainPort for RecordingAuditTrail {}

#[async_trait]
impl AuditTrail for RecordingAuditTrail {
    async fn record(&self, entry: &AuditEntry) -> Result<(), PortError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PortError::connection("audit sink offline"));
        }
        self.entries.write().await.push(entry.clone());
        Ok(())
    }
}
