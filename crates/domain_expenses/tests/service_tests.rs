//! Tests for ClaimApprovalService over the in-memory ports

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal_macros::dec;

use core_kernel::{ClaimId, Currency, Money, UserId};

use domain_expenses::mock::{InMemoryClaimsPort, RecordingAuditTrail, StaticApproverDirectory};
use domain_expenses::{
    ActingUser, ClaimApprovalService, ClaimDetails, ClaimError, ClaimErrorKind, ClaimQuery,
    ClaimStatus, ExpenseClaim, NewReceipt, Role,
};

struct Harness {
    service: ClaimApprovalService,
    port: Arc<InMemoryClaimsPort>,
    directory: Arc<StaticApproverDirectory>,
    audit: Arc<RecordingAuditTrail>,
}

impl Harness {
    async fn with_claims(claims: Vec<ExpenseClaim>) -> Self {
        let port = Arc::new(InMemoryClaimsPort::with_claims(claims).await);
        let directory = Arc::new(StaticApproverDirectory::new());
        let audit = Arc::new(RecordingAuditTrail::new());
        let service = ClaimApprovalService::new(port.clone(), directory.clone(), audit.clone());
        Self { service, port, directory, audit }
    }
}

fn details(total: rust_decimal::Decimal) -> ClaimDetails {
    ClaimDetails::new("Crew transport", Money::new(total, Currency::MYR))
}

fn pending_claim(owner: UserId) -> ExpenseClaim {
    let mut claim = ExpenseClaim::draft(owner, details(dec!(250))).unwrap();
    claim.submit(owner, Utc::now()).unwrap();
    claim
}

fn admin() -> ActingUser {
    ActingUser::new(UserId::new()).with_role(Role::Admin)
}

// ============================================================================
// Approval Tests
// ============================================================================

mod approval_tests {
    use super::*;

    #[tokio::test]
    async fn test_admin_approves_pending_claim() {
        let owner = UserId::new();
        let claim = pending_claim(owner);
        let h = Harness::with_claims(vec![claim.clone()]).await;
        let approver = admin();

        let approved = h.service.approve_claim(Some(&approver), claim.id).await.unwrap();

        assert_eq!(approved.status, ClaimStatus::Approved);
        assert_eq!(approved.approved_by, Some(approver.id));
        assert!(approved.approved_at.is_some());

        let entries = h.audit.entries().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].from_status, ClaimStatus::Pending);
        assert_eq!(entries[0].to_status, ClaimStatus::Approved);
    }

    #[tokio::test]
    async fn test_assigned_manager_approves() {
        let owner = UserId::new();
        let claim = pending_claim(owner);
        let h = Harness::with_claims(vec![claim.clone()]).await;
        let manager = ActingUser::new(UserId::new()).with_role(Role::Manager);
        h.directory.grant(manager.id, owner).await;

        let approved = h.service.approve_claim(Some(&manager), claim.id).await.unwrap();
        assert_eq!(approved.status, ClaimStatus::Approved);
    }

    #[tokio::test]
    async fn test_unrelated_user_is_refused() {
        let owner = UserId::new();
        let claim = pending_claim(owner);
        let h = Harness::with_claims(vec![claim.clone()]).await;
        let staff = ActingUser::new(UserId::new()).with_role(Role::Staff);

        let result = h.service.approve_claim(Some(&staff), claim.id).await;

        assert!(matches!(result, Err(ClaimError::Unauthorized(_))));
        let stored = h.service.get_claim(Some(&admin()), claim.id).await.unwrap();
        assert_eq!(stored.status, ClaimStatus::Pending);
        assert!(h.audit.entries().await.is_empty());
    }

    #[tokio::test]
    async fn test_admin_cannot_approve_own_claim() {
        let me = admin();
        let claim = pending_claim(me.id);
        let h = Harness::with_claims(vec![claim.clone()]).await;

        let result = h.service.approve_claim(Some(&me), claim.id).await;
        assert_eq!(result.unwrap_err().kind(), ClaimErrorKind::Authorization);
    }

    #[tokio::test]
    async fn test_no_session_is_unauthorized() {
        let claim = pending_claim(UserId::new());
        let h = Harness::with_claims(vec![claim.clone()]).await;

        let result = h.service.approve_claim(None, claim.id).await;
        assert!(matches!(result, Err(ClaimError::Unauthorized(_))));
        assert_eq!(h.port.call_count(), 0);
    }

    #[tokio::test]
    async fn test_approving_draft_conflicts() {
        let owner = UserId::new();
        let claim = ExpenseClaim::draft(owner, details(dec!(10))).unwrap();
        let h = Harness::with_claims(vec![claim.clone()]).await;

        let result = h.service.approve_claim(Some(&admin()), claim.id).await;
        assert!(matches!(result, Err(ClaimError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_second_approval_conflicts_without_audit() {
        let claim = pending_claim(UserId::new());
        let h = Harness::with_claims(vec![claim.clone()]).await;
        let approver = admin();

        h.service.approve_claim(Some(&approver), claim.id).await.unwrap();
        let again = h.service.approve_claim(Some(&approver), claim.id).await;

        assert!(matches!(again, Err(ClaimError::Conflict(_))));
        assert_eq!(h.audit.entries().await.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_claim_is_not_found() {
        let h = Harness::with_claims(vec![]).await;
        let result = h.service.approve_claim(Some(&admin()), ClaimId::new()).await;
        assert_eq!(result.unwrap_err().kind(), ClaimErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_storage_outage_is_transient() {
        let claim = pending_claim(UserId::new());
        let h = Harness::with_claims(vec![claim.clone()]).await;
        h.port.set_unavailable(true);

        let result = h.service.approve_claim(Some(&admin()), claim.id).await;
        assert!(matches!(result, Err(ClaimError::Transient(_))));
    }

    #[tokio::test]
    async fn test_audit_failure_keeps_approval() {
        let claim = pending_claim(UserId::new());
        let h = Harness::with_claims(vec![claim.clone()]).await;
        h.audit.set_failing(true);

        let approved = h.service.approve_claim(Some(&admin()), claim.id).await.unwrap();
        assert_eq!(approved.status, ClaimStatus::Approved);
        assert!(h.audit.entries().await.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_approvals_have_one_winner() {
        let claim = pending_claim(UserId::new());
        let h = Harness::with_claims(vec![claim.clone()]).await;
        let first = admin();
        let second = admin();

        let (a, b) = tokio::join!(
            {
                let service = h.service.clone();
                let first = first.clone();
                tokio::spawn(async move { service.approve_claim(Some(&first), claim.id).await })
            },
            {
                let service = h.service.clone();
                let second = second.clone();
                tokio::spawn(async move { service.approve_claim(Some(&second), claim.id).await })
            }
        );
        let results = [a.unwrap(), b.unwrap()];

        let wins = results.iter().filter(|r| r.is_ok()).count();
        let conflicts = results
            .iter()
            .filter(|r| matches!(r, Err(e) if e.is_conflict()))
            .count();
        assert_eq!(wins, 1);
        assert_eq!(conflicts, 1);
        assert_eq!(h.audit.entries().await.len(), 1);

        let stored = h.service.get_claim(Some(&admin()), claim.id).await.unwrap();
        assert!(stored.approved_by == Some(first.id) || stored.approved_by == Some(second.id));
    }
}

// ============================================================================
// Rejection Tests
// ============================================================================

mod rejection_tests {
    use super::*;

    #[tokio::test]
    async fn test_reject_with_reason() {
        let claim = pending_claim(UserId::new());
        let h = Harness::with_claims(vec![claim.clone()]).await;
        let approver = admin();

        let rejected = h
            .service
            .reject_claim(Some(&approver), claim.id, "  Missing receipt ")
            .await
            .unwrap();

        assert_eq!(rejected.status, ClaimStatus::Rejected);
        assert_eq!(rejected.rejection_reason.as_deref(), Some("Missing receipt"));
        assert_eq!(rejected.rejected_by, Some(approver.id));

        let entries = h.audit.entries().await;
        assert_eq!(entries[0].reason.as_deref(), Some("Missing receipt"));
    }

    #[tokio::test]
    async fn test_blank_reason_makes_no_port_call() {
        let claim = pending_claim(UserId::new());
        let h = Harness::with_claims(vec![claim.clone()]).await;

        let result = h.service.reject_claim(Some(&admin()), claim.id, "   ").await;

        assert!(matches!(result, Err(ClaimError::Validation(_))));
        assert_eq!(h.port.call_count(), 0);
    }

    #[tokio::test]
    async fn test_owner_cannot_reject_own_claim() {
        let owner = ActingUser::new(UserId::new()).with_role(Role::Manager);
        let claim = pending_claim(owner.id);
        let h = Harness::with_claims(vec![claim.clone()]).await;
        h.directory.grant(owner.id, owner.id).await;

        let result = h.service.reject_claim(Some(&owner), claim.id, "duplicate").await;
        assert!(matches!(result, Err(ClaimError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_reject_after_approval_conflicts() {
        let claim = pending_claim(UserId::new());
        let h = Harness::with_claims(vec![claim.clone()]).await;
        let approver = admin();
        h.service.approve_claim(Some(&approver), claim.id).await.unwrap();

        let result = h.service.reject_claim(Some(&approver), claim.id, "too late").await;
        assert!(matches!(result, Err(ClaimError::Conflict(_))));
    }
}

// ============================================================================
// Draft Lifecycle Tests
// ============================================================================

mod draft_tests {
    use super::*;

    #[tokio::test]
    async fn test_create_draft_then_submit() {
        let h = Harness::with_claims(vec![]).await;
        let staff = ActingUser::new(UserId::new()).with_role(Role::Staff);

        let draft = h
            .service
            .create_claim(Some(&staff), details(dec!(80)), false)
            .await
            .unwrap();
        assert_eq!(draft.status, ClaimStatus::Draft);
        assert!(h.audit.entries().await.is_empty());

        let submitted = h.service.submit_claim(Some(&staff), draft.id).await.unwrap();
        assert_eq!(submitted.status, ClaimStatus::Pending);
        assert_eq!(h.audit.entries().await.len(), 1);
    }

    #[tokio::test]
    async fn test_create_and_submit_immediately() {
        let h = Harness::with_claims(vec![]).await;
        let staff = ActingUser::new(UserId::new());

        let claim = h
            .service
            .create_claim(Some(&staff), details(dec!(80)), true)
            .await
            .unwrap();

        assert_eq!(claim.status, ClaimStatus::Pending);
        assert!(claim.submitted_at.is_some());
        assert_eq!(h.audit.entries().await[0].to_status, ClaimStatus::Pending);
    }

    #[tokio::test]
    async fn test_create_requires_session() {
        let h = Harness::with_claims(vec![]).await;
        let result = h.service.create_claim(None, details(dec!(80)), false).await;
        assert!(matches!(result, Err(ClaimError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_update_draft_by_owner_only() {
        let owner = ActingUser::new(UserId::new());
        let claim = ExpenseClaim::draft(owner.id, details(dec!(10))).unwrap();
        let h = Harness::with_claims(vec![claim.clone()]).await;

        let other = ActingUser::new(UserId::new());
        let refused = h
            .service
            .update_draft(Some(&other), claim.id, details(dec!(20)))
            .await;
        assert!(matches!(refused, Err(ClaimError::Unauthorized(_))));

        let updated = h
            .service
            .update_draft(Some(&owner), claim.id, details(dec!(20)).with_description("Taxi"))
            .await
            .unwrap();
        assert_eq!(updated.total_amount.amount(), dec!(20));
        assert_eq!(updated.description.as_deref(), Some("Taxi"));
    }

    #[tokio::test]
    async fn test_receipts_and_summary() {
        let owner = ActingUser::new(UserId::new());
        let claim = ExpenseClaim::draft(owner.id, details(dec!(100))).unwrap();
        let h = Harness::with_claims(vec![claim.clone()]).await;
        let date = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();

        for (amount, vendor) in [(dec!(60), "Petronas"), (dec!(40), "Touch n Go")] {
            h.service
                .attach_receipt(
                    Some(&owner),
                    claim.id,
                    NewReceipt::new(Money::new(amount, Currency::MYR), date, vendor),
                )
                .await
                .unwrap();
        }

        let summary = h.service.claim_summary(Some(&owner), claim.id).await.unwrap();
        assert_eq!(summary.receipt_count, 2);
        assert!(summary.is_balanced());
        assert_eq!(summary.receipts_total_display, "RM 100.00");
    }

    #[tokio::test]
    async fn test_receipts_locked_after_submit() {
        let owner = ActingUser::new(UserId::new());
        let claim = pending_claim(owner.id);
        let h = Harness::with_claims(vec![claim.clone()]).await;

        let result = h
            .service
            .attach_receipt(
                Some(&owner),
                claim.id,
                NewReceipt::new(
                    Money::new(dec!(5), Currency::MYR),
                    NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
                    "Kedai",
                ),
            )
            .await;
        assert!(matches!(result, Err(ClaimError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_non_owner_cannot_submit_pending_claim() {
        let owner = UserId::new();
        let claim = pending_claim(owner);
        let h = Harness::with_claims(vec![claim.clone()]).await;
        let other = ActingUser::new(UserId::new()).with_role(Role::Staff);

        let result = h.service.submit_claim(Some(&other), claim.id).await;

        assert_eq!(result.unwrap_err().kind(), ClaimErrorKind::Authorization);
    }

    #[tokio::test]
    async fn test_reads_limited_to_owner_and_reviewers() {
        let owner = ActingUser::new(UserId::new()).with_role(Role::Staff);
        let claim = pending_claim(owner.id);
        let h = Harness::with_claims(vec![claim.clone()]).await;
        let colleague = ActingUser::new(UserId::new()).with_role(Role::Staff);
        let manager = ActingUser::new(UserId::new()).with_role(Role::Manager);

        assert!(h.service.get_claim(Some(&owner), claim.id).await.is_ok());
        assert!(h.service.get_claim(Some(&manager), claim.id).await.is_ok());

        let read = h.service.get_claim(Some(&colleague), claim.id).await;
        assert_eq!(read.unwrap_err().kind(), ClaimErrorKind::Authorization);
        let receipts = h.service.list_receipts(Some(&colleague), claim.id).await;
        assert_eq!(receipts.unwrap_err().kind(), ClaimErrorKind::Authorization);
        let summary = h.service.claim_summary(Some(&colleague), claim.id).await;
        assert_eq!(summary.unwrap_err().kind(), ClaimErrorKind::Authorization);
        assert!(h.service.get_claim(None, claim.id).await.is_err());

        h.directory.grant(colleague.id, owner.id).await;
        assert!(h.service.list_receipts(Some(&colleague), claim.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_list_claims_by_owner() {
        let owner = UserId::new();
        let h = Harness::with_claims(vec![
            pending_claim(owner),
            pending_claim(owner),
            pending_claim(UserId::new()),
        ])
        .await;

        let mine = h.service.list_claims(ClaimQuery::by_owner(owner)).await.unwrap();
        assert_eq!(mine.len(), 2);

        let page = h
            .service
            .list_claims(ClaimQuery::by_status(ClaimStatus::Pending).paginate(2, 0))
            .await
            .unwrap();
        assert_eq!(page.len(), 2);
    }
}

// ============================================================================
// Can-Approve Tests
// ============================================================================

mod can_approve_tests {
    use super::*;

    #[tokio::test]
    async fn test_can_approve_claim() {
        let owner = UserId::new();
        let claim = pending_claim(owner);
        let draft = ExpenseClaim::draft(owner, details(dec!(5))).unwrap();
        let h = Harness::with_claims(vec![claim.clone(), draft.clone()]).await;
        let approver = admin();

        assert!(h.service.can_approve_claim(Some(&approver), claim.id).await.unwrap());
        assert!(!h.service.can_approve_claim(Some(&approver), draft.id).await.unwrap());
        assert!(!h.service.can_approve_claim(None, claim.id).await.unwrap());

        let me = ActingUser::new(owner).with_role(Role::Admin);
        assert!(!h.service.can_approve_claim(Some(&me), claim.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_directory_failure_denies() {
        let owner = UserId::new();
        let claim = pending_claim(owner);
        let h = Harness::with_claims(vec![claim.clone()]).await;
        let manager = ActingUser::new(UserId::new()).with_role(Role::Manager);
        h.directory.grant(manager.id, owner).await;
        h.directory.set_failing(true);

        assert!(!h.service.can_approve_claim(Some(&manager), claim.id).await.unwrap());
        let result = h.service.approve_claim(Some(&manager), claim.id).await;
        assert!(matches!(result, Err(ClaimError::Unauthorized(_))));
    }
}
