//! Audit trail entries for claim status changes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{AuditEventId, ClaimId, UserId};
use crate::claim::{ClaimStatus, ClaimTransition};

/// A recorded status change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: AuditEventId,
    pub claim_id: ClaimId,
    pub from_status: ClaimStatus,
    pub to_status: ClaimStatus,
    pub actor: UserId,
    pub reason: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl From<&ClaimTransition> for AuditEntry {
    fn from(transition: &ClaimTransition) -> Self {
        Self {
            id: AuditEventId::new_v7(),
            claim_id: transition.claim_id,
            from_status: transition.from,
            to_status: transition.to,
            actor: transition.actor,
            reason: transition.reason.as_ref().map(|r| r.to_string()),
            recorded_at: transition.at,
        }
    }
}
