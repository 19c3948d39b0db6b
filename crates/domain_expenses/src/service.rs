//! Claim approval service
//!
//! Orchestrates the aggregate, the authorization check, and the ports. Each
//! operation takes the acting user explicitly and returns the single
//! refreshed claim so callers can update their view without a reload.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};

use core_kernel::{ClaimId, OperationMetadata};

use crate::audit::AuditEntry;
use crate::authorization::{can_approve, can_view, ActingUser, ApproverDirectory};
use crate::claim::{ClaimDetails, ClaimStatus, ClaimTransition, ExpenseClaim, RejectionReason};
use crate::error::ClaimError;
use crate::ports::{AuditTrail, ClaimQuery, ClaimsPort};
use crate::receipt::{NewReceipt, Receipt};
use crate::summary::{summarize, ReceiptSummary};

/// Application service for the claim lifecycle
#[derive(Clone)]
pub struct ClaimApprovalService {
    claims: Arc<dyn ClaimsPort>,
    directory: Arc<dyn ApproverDirectory>,
    audit: Arc<dyn AuditTrail>,
}

impl ClaimApprovalService {
    pub fn new(
        claims: Arc<dyn ClaimsPort>,
        directory: Arc<dyn ApproverDirectory>,
        audit: Arc<dyn AuditTrail>,
    ) -> Self {
        Self { claims, directory, audit }
    }

    /// Returns the claims port, e.g. for health checks
    pub fn claims_port(&self) -> &Arc<dyn ClaimsPort> {
        &self.claims
    }

    /// Creates a draft owned by the acting user, optionally submitting it at once
    #[instrument(skip(self, acting, details))]
    pub async fn create_claim(
        &self,
        acting: Option<&ActingUser>,
        details: ClaimDetails,
        submit: bool,
    ) -> Result<ExpenseClaim, ClaimError> {
        let acting = require_session(acting)?;
        let mut claim = ExpenseClaim::draft(acting.id, details)?;
        let submission = if submit {
            Some(claim.submit(acting.id, Utc::now())?)
        } else {
            None
        };

        let created = self.claims.create_claim(&claim, Some(metadata(acting))).await?;
        info!(claim_id = %created.id, status = %created.status, "Expense claim created");

        if let Some(transition) = submission {
            self.record_audit(&transition).await;
        }
        Ok(created)
    }

    /// Edits a draft; owner only
    #[instrument(skip(self, acting, details), fields(claim_id = %claim_id))]
    pub async fn update_draft(
        &self,
        acting: Option<&ActingUser>,
        claim_id: ClaimId,
        details: ClaimDetails,
    ) -> Result<ExpenseClaim, ClaimError> {
        let acting = require_session(acting)?;
        let mut claim = self.claims.get_claim(claim_id, None).await?;
        claim.edit_details(acting.id, details)?;

        let updated = self.claims.update_draft(&claim, Some(metadata(acting))).await?;
        info!("Draft claim updated");
        Ok(updated)
    }

    /// Attaches a receipt to a draft; owner only
    #[instrument(skip(self, acting, receipt), fields(claim_id = %claim_id))]
    pub async fn attach_receipt(
        &self,
        acting: Option<&ActingUser>,
        claim_id: ClaimId,
        receipt: NewReceipt,
    ) -> Result<Receipt, ClaimError> {
        let acting = require_session(acting)?;
        let claim = self.claims.get_claim(claim_id, None).await?;
        let receipt = Receipt::attach(&claim, acting.id, receipt)?;

        let stored = self.claims.attach_receipt(&receipt, Some(metadata(acting))).await?;
        info!(receipt_id = %stored.id, "Receipt attached");
        Ok(stored)
    }

    /// Submits a draft for approval; owner only
    #[instrument(skip(self, acting), fields(claim_id = %claim_id))]
    pub async fn submit_claim(
        &self,
        acting: Option<&ActingUser>,
        claim_id: ClaimId,
    ) -> Result<ExpenseClaim, ClaimError> {
        let acting = require_session(acting)?;
        let mut claim = self.claims.get_claim(claim_id, None).await?;
        if !claim.is_owned_by(acting.id) {
            return Err(ClaimError::unauthorized("only the claim owner can submit it"));
        }
        ensure_status(&claim, ClaimStatus::Draft)?;

        let transition = claim.submit(acting.id, Utc::now())?;
        self.persist(acting, &transition).await
    }

    /// Approves a pending claim
    ///
    /// Fails with `Conflict` unless the claim is pending at both read and
    /// write time, and with `Unauthorized` before any write when the acting
    /// user may not approve it.
    #[instrument(skip(self, acting), fields(claim_id = %claim_id))]
    pub async fn approve_claim(
        &self,
        acting: Option<&ActingUser>,
        claim_id: ClaimId,
    ) -> Result<ExpenseClaim, ClaimError> {
        let acting = require_session(acting)?;
        let mut claim = self.claims.get_claim(claim_id, None).await?;
        ensure_status(&claim, ClaimStatus::Pending)?;
        self.ensure_can_decide(acting, &claim).await?;

        let transition = claim.approve(acting.id, Utc::now())?;
        self.persist(acting, &transition).await
    }

    /// Rejects a pending claim with a non-empty reason
    ///
    /// The reason is validated before any port call.
    #[instrument(skip(self, acting, reason), fields(claim_id = %claim_id))]
    pub async fn reject_claim(
        &self,
        acting: Option<&ActingUser>,
        claim_id: ClaimId,
        reason: &str,
    ) -> Result<ExpenseClaim, ClaimError> {
        let reason = RejectionReason::parse(reason)?;
        let acting = require_session(acting)?;
        let mut claim = self.claims.get_claim(claim_id, None).await?;
        ensure_status(&claim, ClaimStatus::Pending)?;
        self.ensure_can_decide(acting, &claim).await?;

        let transition = claim.reject(acting.id, reason, Utc::now())?;
        self.persist(acting, &transition).await
    }

    /// Whether the acting user could approve the claim right now
    pub async fn can_approve_claim(
        &self,
        acting: Option<&ActingUser>,
        claim_id: ClaimId,
    ) -> Result<bool, ClaimError> {
        let claim = self.claims.get_claim(claim_id, None).await?;
        if claim.status != ClaimStatus::Pending {
            return Ok(false);
        }
        Ok(can_approve(self.directory.as_ref(), acting, claim.created_by).await)
    }

    /// Reads a claim; owners, reviewers and assigned approvers only
    pub async fn get_claim(
        &self,
        acting: Option<&ActingUser>,
        claim_id: ClaimId,
    ) -> Result<ExpenseClaim, ClaimError> {
        let claim = self.claims.get_claim(claim_id, None).await?;
        self.ensure_can_view(acting, &claim).await?;
        Ok(claim)
    }

    pub async fn list_claims(&self, query: ClaimQuery) -> Result<Vec<ExpenseClaim>, ClaimError> {
        Ok(self.claims.list_claims(query, None).await?)
    }

    pub async fn list_receipts(
        &self,
        acting: Option<&ActingUser>,
        claim_id: ClaimId,
    ) -> Result<Vec<Receipt>, ClaimError> {
        self.get_claim(acting, claim_id).await?;
        Ok(self.claims.list_receipts(claim_id, None).await?)
    }

    /// Builds the receipt summary of a claim from fresh data
    pub async fn claim_summary(
        &self,
        acting: Option<&ActingUser>,
        claim_id: ClaimId,
    ) -> Result<ReceiptSummary, ClaimError> {
        let claim = self.get_claim(acting, claim_id).await?;
        let receipts = self.claims.list_receipts(claim_id, None).await?;
        summarize(&claim, &receipts)
    }

    async fn ensure_can_view(
        &self,
        acting: Option<&ActingUser>,
        claim: &ExpenseClaim,
    ) -> Result<(), ClaimError> {
        if can_view(self.directory.as_ref(), acting, claim.created_by).await {
            return Ok(());
        }
        Err(ClaimError::unauthorized(format!("claim {} is not visible to this user", claim.id)))
    }

    async fn ensure_can_decide(&self, acting: &ActingUser, claim: &ExpenseClaim) -> Result<(), ClaimError> {
        if can_approve(self.directory.as_ref(), Some(acting), claim.created_by).await {
            return Ok(());
        }
        warn!(actor = %acting.id, claim_id = %claim.id, "Claim decision refused");
        Err(ClaimError::unauthorized(format!(
            "user {} may not decide on claim {}",
            acting.id, claim.id
        )))
    }

    async fn persist(
        &self,
        acting: &ActingUser,
        transition: &ClaimTransition,
    ) -> Result<ExpenseClaim, ClaimError> {
        let updated = self
            .claims
            .transition_claim(transition, Some(metadata(acting)))
            .await
            .map_err(|e| {
                if e.is_conflict() {
                    warn!(
                        claim_id = %transition.claim_id,
                        expected = %transition.from,
                        "Claim changed concurrently"
                    );
                }
                ClaimError::from(e)
            })?;

        info!(
            claim_id = %updated.id,
            from = %transition.from,
            to = %transition.to,
            actor = %transition.actor,
            "Claim status changed"
        );
        self.record_audit(transition).await;
        Ok(updated)
    }

    /// Best-effort: a failed audit write never undoes the status change
    async fn record_audit(&self, transition: &ClaimTransition) {
        let entry = AuditEntry::from(transition);
        if let Err(e) = self.audit.record(&entry).await {
            warn!(claim_id = %entry.claim_id, error = %e, "Failed to record claim audit entry");
        }
    }
}

fn require_session(acting: Option<&ActingUser>) -> Result<&ActingUser, ClaimError> {
    acting.ok_or_else(|| ClaimError::unauthorized("no authenticated session"))
}

fn ensure_status(claim: &ExpenseClaim, expected: ClaimStatus) -> Result<(), ClaimError> {
    if claim.status != expected {
        return Err(ClaimError::conflict(format!(
            "claim {} is {}, expected {}",
            claim.id, claim.status, expected
        )));
    }
    Ok(())
}

fn metadata(acting: &ActingUser) -> OperationMetadata {
    OperationMetadata::default().initiated_by(acting.id)
}
