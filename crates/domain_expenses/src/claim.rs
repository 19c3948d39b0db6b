//! Expense claim aggregate and its status state machine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{ClaimId, Currency, Money, ProjectId, UserId};
use crate::error::ClaimError;

/// Claim status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    /// Being prepared by its owner
    Draft,
    /// Submitted and awaiting a decision
    Pending,
    /// Approved for reimbursement
    Approved,
    /// Rejected with a reason
    Rejected,
}

impl ClaimStatus {
    pub const ALL: [ClaimStatus; 4] = [
        ClaimStatus::Draft,
        ClaimStatus::Pending,
        ClaimStatus::Approved,
        ClaimStatus::Rejected,
    ];

    /// Returns the persisted name of the status
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStatus::Draft => "draft",
            ClaimStatus::Pending => "pending",
            ClaimStatus::Approved => "approved",
            ClaimStatus::Rejected => "rejected",
        }
    }

    /// Approved and Rejected never transition again
    pub fn is_terminal(&self) -> bool {
        matches!(self, ClaimStatus::Approved | ClaimStatus::Rejected)
    }

    /// Applies an event to this status
    pub fn on(self, event: ClaimEvent) -> Result<ClaimStatus, ClaimError> {
        use ClaimEvent::*;
        use ClaimStatus::*;
        match (self, event) {
            (Draft, Submit) => Ok(Pending),
            (Pending, Approve) => Ok(Approved),
            (Pending, Reject) => Ok(Rejected),
            (from, event) => Err(ClaimError::InvalidStatusTransition {
                from: from.to_string(),
                event: event.to_string(),
            }),
        }
    }
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClaimStatus {
    type Err = ClaimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(ClaimStatus::Draft),
            "pending" => Ok(ClaimStatus::Pending),
            "approved" => Ok(ClaimStatus::Approved),
            "rejected" => Ok(ClaimStatus::Rejected),
            other => Err(ClaimError::validation(format!("unknown claim status '{}'", other))),
        }
    }
}

/// Events that move a claim through its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimEvent {
    Submit,
    Approve,
    Reject,
}

impl fmt::Display for ClaimEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ClaimEvent::Submit => "submit",
            ClaimEvent::Approve => "approve",
            ClaimEvent::Reject => "reject",
        };
        f.write_str(name)
    }
}

/// A trimmed, non-empty rejection reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RejectionReason(String);

impl RejectionReason {
    /// Parses a reason, rejecting empty or whitespace-only input
    pub fn parse(raw: &str) -> Result<Self, ClaimError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ClaimError::validation("rejection reason is required"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RejectionReason {
    type Error = ClaimError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RejectionReason> for String {
    fn from(reason: RejectionReason) -> String {
        reason.0
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Owner-editable fields of a claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimDetails {
    pub title: String,
    pub description: Option<String>,
    pub total_amount: Money,
    pub project_id: Option<ProjectId>,
}

impl ClaimDetails {
    /// Creates details with no description or project
    pub fn new(title: impl Into<String>, total_amount: Money) -> Self {
        Self {
            title: title.into(),
            description: None,
            total_amount,
            project_id: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn for_project(mut self, project_id: ProjectId) -> Self {
        self.project_id = Some(project_id);
        self
    }

    /// Checks title and amount, normalizing whitespace
    pub fn validated(mut self) -> Result<Self, ClaimError> {
        self.title = self.title.trim().to_string();
        if self.title.is_empty() {
            return Err(ClaimError::validation("claim title is required"));
        }
        if self.total_amount.is_negative() {
            return Err(ClaimError::validation("claim amount cannot be negative"));
        }
        self.description = self
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        Ok(self)
    }
}

/// A status change produced by the aggregate, persisted as a check-and-set
/// on `from`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimTransition {
    pub claim_id: ClaimId,
    pub event: ClaimEvent,
    pub from: ClaimStatus,
    pub to: ClaimStatus,
    pub actor: UserId,
    pub at: DateTime<Utc>,
    pub reason: Option<RejectionReason>,
}

/// An expense reimbursement claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseClaim {
    /// Unique identifier
    pub id: ClaimId,
    pub title: String,
    pub description: Option<String>,
    pub status: ClaimStatus,
    /// Claimed total; its currency is the claim currency
    pub total_amount: Money,
    /// Submitting user, immutable
    pub created_by: UserId,
    /// Display only, never used for authorization
    pub project_id: Option<ProjectId>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub approved_at: Option<DateTime<Utc>>,
    pub approved_by: Option<UserId>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub rejected_by: Option<UserId>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ExpenseClaim {
    /// Creates a new draft owned by `owner`
    pub fn draft(owner: UserId, details: ClaimDetails) -> Result<Self, ClaimError> {
        let details = details.validated()?;
        let now = Utc::now();

        Ok(Self {
            id: ClaimId::new_v7(),
            title: details.title,
            description: details.description,
            status: ClaimStatus::Draft,
            total_amount: details.total_amount,
            created_by: owner,
            project_id: details.project_id,
            submitted_at: None,
            approved_at: None,
            approved_by: None,
            rejected_at: None,
            rejected_by: None,
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Returns the claim currency
    pub fn currency(&self) -> Currency {
        self.total_amount.currency()
    }

    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.created_by == user
    }

    /// Fails unless `actor` owns this claim and it is still a draft
    pub fn ensure_editable_by(&self, actor: UserId) -> Result<(), ClaimError> {
        if !self.is_owned_by(actor) {
            return Err(ClaimError::unauthorized("only the claim owner can edit a draft"));
        }
        if self.status != ClaimStatus::Draft {
            return Err(ClaimError::conflict(format!(
                "claim {} is {} and can no longer be edited",
                self.id, self.status
            )));
        }
        Ok(())
    }

    /// Replaces the owner-editable fields of a draft
    pub fn edit_details(&mut self, actor: UserId, details: ClaimDetails) -> Result<(), ClaimError> {
        self.ensure_editable_by(actor)?;
        let details = details.validated()?;
        if details.total_amount.currency() != self.currency() {
            return Err(ClaimError::validation(format!(
                "claim currency is {} and cannot change to {}",
                self.currency(),
                details.total_amount.currency()
            )));
        }

        self.title = details.title;
        self.description = details.description;
        self.total_amount = details.total_amount;
        self.project_id = details.project_id;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Moves a draft to pending; only the owner may submit
    pub fn submit(&mut self, actor: UserId, at: DateTime<Utc>) -> Result<ClaimTransition, ClaimError> {
        if !self.is_owned_by(actor) {
            return Err(ClaimError::unauthorized("only the claim owner can submit it"));
        }
        self.transition(ClaimEvent::Submit, actor, at, None)
    }

    /// Approves a pending claim
    ///
    /// Authorization against the approver directory happens in the service;
    /// the aggregate only refuses self-approval.
    pub fn approve(&mut self, approver: UserId, at: DateTime<Utc>) -> Result<ClaimTransition, ClaimError> {
        if self.is_owned_by(approver) {
            return Err(ClaimError::unauthorized("a user cannot approve their own claim"));
        }
        self.transition(ClaimEvent::Approve, approver, at, None)
    }

    /// Rejects a pending claim with a reason
    pub fn reject(
        &mut self,
        approver: UserId,
        reason: RejectionReason,
        at: DateTime<Utc>,
    ) -> Result<ClaimTransition, ClaimError> {
        if self.is_owned_by(approver) {
            return Err(ClaimError::unauthorized("a user cannot reject their own claim"));
        }
        self.transition(ClaimEvent::Reject, approver, at, Some(reason))
    }

    /// Verifies the decision fields agree with the status
    pub fn check_invariants(&self) -> Result<(), ClaimError> {
        let approved = self.status == ClaimStatus::Approved;
        let rejected = self.status == ClaimStatus::Rejected;

        if self.approved_at.is_some() != approved || self.approved_by.is_some() != approved {
            return Err(ClaimError::validation(format!(
                "claim {} has approval fields inconsistent with status {}",
                self.id, self.status
            )));
        }
        let has_reason = self
            .rejection_reason
            .as_deref()
            .map(|r| !r.trim().is_empty())
            .unwrap_or(false);
        if has_reason != rejected || self.rejected_at.is_some() != rejected {
            return Err(ClaimError::validation(format!(
                "claim {} has rejection fields inconsistent with status {}",
                self.id, self.status
            )));
        }
        if self.status != ClaimStatus::Draft && self.submitted_at.is_none() {
            return Err(ClaimError::validation(format!(
                "claim {} left draft without a submission time",
                self.id
            )));
        }
        if self.total_amount.is_negative() {
            return Err(ClaimError::validation("claim amount cannot be negative"));
        }
        Ok(())
    }

    /// Writes the fields a transition sets onto this claim
    pub(crate) fn record_transition(&mut self, transition: &ClaimTransition) {
        self.status = transition.to;
        self.updated_at = transition.at;
        match transition.to {
            ClaimStatus::Pending => {
                self.submitted_at = Some(transition.at);
            }
            ClaimStatus::Approved => {
                self.approved_at = Some(transition.at);
                self.approved_by = Some(transition.actor);
            }
            ClaimStatus::Rejected => {
                self.rejected_at = Some(transition.at);
                self.rejected_by = Some(transition.actor);
                self.rejection_reason = transition.reason.as_ref().map(|r| r.to_string());
            }
            ClaimStatus::Draft => {}
        }
    }

    fn transition(
        &mut self,
        event: ClaimEvent,
        actor: UserId,
        at: DateTime<Utc>,
        reason: Option<RejectionReason>,
    ) -> Result<ClaimTransition, ClaimError> {
        let to = self.status.on(event)?;
        let transition = ClaimTransition {
            claim_id: self.id,
            event,
            from: self.status,
            to,
            actor,
            at,
            reason,
        };
        self.record_transition(&transition);
        Ok(transition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn pending_claim(owner: UserId) -> ExpenseClaim {
        let mut claim = ExpenseClaim::draft(
            owner,
            ClaimDetails::new("Parking", Money::new(dec!(12.00), Currency::MYR)),
        )
        .unwrap();
        claim.submit(owner, Utc::now()).unwrap();
        claim
    }

    #[test]
    fn test_transition_table() {
        use ClaimEvent::*;
        use ClaimStatus::*;
        assert_eq!(Draft.on(Submit).unwrap(), Pending);
        assert_eq!(Pending.on(Approve).unwrap(), Approved);
        assert_eq!(Pending.on(Reject).unwrap(), Rejected);
        assert!(Draft.on(Approve).is_err());
        assert!(Pending.on(Submit).is_err());
        for terminal in [Approved, Rejected] {
            for event in [Submit, Approve, Reject] {
                assert!(terminal.on(event).is_err());
            }
        }
    }

    #[test]
    fn test_rejection_reason_trims() {
        let reason = RejectionReason::parse("  Missing receipt \n").unwrap();
        assert_eq!(reason.as_str(), "Missing receipt");
        assert!(RejectionReason::parse(" \t ").is_err());
    }

    #[test]
    fn test_approve_sets_decision_fields() {
        let owner = UserId::new();
        let approver = UserId::new();
        let mut claim = pending_claim(owner);

        let transition = claim.approve(approver, Utc::now()).unwrap();

        assert_eq!(transition.from, ClaimStatus::Pending);
        assert_eq!(claim.status, ClaimStatus::Approved);
        assert_eq!(claim.approved_by, Some(approver));
        assert!(claim.approved_at.is_some());
        assert!(claim.check_invariants().is_ok());
    }

    #[test]
    fn test_self_approval_refused() {
        let owner = UserId::new();
        let mut claim = pending_claim(owner);
        let result = claim.approve(owner, Utc::now());
        assert!(matches!(result, Err(ClaimError::Unauthorized(_))));
        assert_eq!(claim.status, ClaimStatus::Pending);
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&ClaimStatus::Pending).unwrap();
        assert_eq!(json, "\"pending\"");
    }
}
