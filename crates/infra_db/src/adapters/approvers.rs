//! PostgreSQL approver directory

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use core_kernel::{DomainPort, PortError, UserId};
use domain_expenses::ApproverDirectory;

use crate::repositories::ApproverRepository;

/// Looks up admin roles and approver assignments
#[derive(Debug, Clone)]
pub struct PostgresApproverDirectory {
    repository: ApproverRepository,
}

impl PostgresApproverDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: ApproverRepository::new(pool),
        }
    }

    pub fn repository(&self) -> &ApproverRepository {
        &self.repository
    }
}

impl DomainPort for PostgresApproverDirectory {}

#[async_trait]
impl ApproverDirectory for PostgresApproverDirectory {
    #[instrument(skip(self), fields(approver = %approver, target = %target))]
    async fn is_approver(&self, approver: UserId, target: UserId) -> Result<bool, PortError> {
        Ok(self
            .repository
            .may_approve(*approver.as_uuid(), *target.as_uuid())
            .await?)
    }
}
