//! Expense Claims Ports
//!
//! Port interfaces the claims domain needs from its collaborators. The
//! PostgreSQL adapters live in `infra_db`; in-memory versions live in
//! [`crate::mock`] behind the `mock` feature.
//!
//! ```rust,ignore
//! let service = ClaimApprovalService::new(
//!     Arc::new(PostgresClaimsAdapter::new(pool.clone())),
//!     Arc::new(PostgresApproverDirectory::new(pool.clone())),
//!     Arc::new(PostgresClaimsAdapter::new(pool)),
//! );
//! ```

use async_trait::async_trait;

use core_kernel::{
    ClaimId, DomainPort, HealthCheckable, OperationMetadata, PortError, ProjectId, UserId,
};

use crate::audit::AuditEntry;
use crate::claim::{ClaimStatus, ClaimTransition, ExpenseClaim};
use crate::receipt::Receipt;

/// Query parameters for listing claims
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimQuery {
    /// Filter by submitting user
    pub created_by: Option<UserId>,
    /// Filter by status
    pub status: Option<ClaimStatus>,
    /// Filter by project
    pub project_id: Option<ProjectId>,
    /// Limit results
    pub limit: Option<u32>,
    /// Offset for pagination
    pub offset: Option<u32>,
}

impl ClaimQuery {
    /// Claims submitted by one user
    pub fn by_owner(owner: UserId) -> Self {
        Self {
            created_by: Some(owner),
            ..Default::default()
        }
    }

    /// Claims in one status
    pub fn by_status(status: ClaimStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn in_project(mut self, project_id: ProjectId) -> Self {
        self.project_id = Some(project_id);
        self
    }

    /// Adds pagination to the query
    pub fn paginate(mut self, limit: u32, offset: u32) -> Self {
        self.limit = Some(limit);
        self.offset = Some(offset);
        self
    }

    /// Whether `claim` satisfies the filters (pagination excluded)
    pub fn matches(&self, claim: &ExpenseClaim) -> bool {
        self.created_by.map_or(true, |owner| claim.created_by == owner)
            && self.status.map_or(true, |status| claim.status == status)
            && self
                .project_id
                .map_or(true, |project| claim.project_id == Some(project))
    }
}

/// Persistence port for claims and their receipts
///
/// Every write that depends on the claim status is a conditional update on
/// the status the caller observed; a mismatch is reported as
/// `PortError::Conflict` and a missing row as `PortError::NotFound`.
#[async_trait]
pub trait ClaimsPort: DomainPort + HealthCheckable {
    /// Retrieves a claim by ID
    async fn get_claim(
        &self,
        id: ClaimId,
        metadata: Option<OperationMetadata>,
    ) -> Result<ExpenseClaim, PortError>;

    /// Lists claims matching the query, newest first
    async fn list_claims(
        &self,
        query: ClaimQuery,
        metadata: Option<OperationMetadata>,
    ) -> Result<Vec<ExpenseClaim>, PortError>;

    /// Inserts a new claim
    async fn create_claim(
        &self,
        claim: &ExpenseClaim,
        metadata: Option<OperationMetadata>,
    ) -> Result<ExpenseClaim, PortError>;

    /// Saves owner edits, only while the stored claim is still a draft
    async fn update_draft(
        &self,
        claim: &ExpenseClaim,
        metadata: Option<OperationMetadata>,
    ) -> Result<ExpenseClaim, PortError>;

    /// Applies a status transition if the stored status equals `transition.from`
    ///
    /// Returns the refreshed claim.
    async fn transition_claim(
        &self,
        transition: &ClaimTransition,
        metadata: Option<OperationMetadata>,
    ) -> Result<ExpenseClaim, PortError>;

    /// Lists the receipts of a claim
    async fn list_receipts(
        &self,
        claim_id: ClaimId,
        metadata: Option<OperationMetadata>,
    ) -> Result<Vec<Receipt>, PortError>;

    /// Attaches a receipt, only while the claim is still a draft
    async fn attach_receipt(
        &self,
        receipt: &Receipt,
        metadata: Option<OperationMetadata>,
    ) -> Result<Receipt, PortError>;
}

/// Sink for claim status history
#[async_trait]
pub trait AuditTrail: DomainPort {
    /// Records one status change
    async fn record(&self, entry: &AuditEntry) -> Result<(), PortError>;
}
