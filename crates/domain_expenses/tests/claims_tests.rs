//! Tests for the claim aggregate, receipts, and the summary view

use chrono::{NaiveDate, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{Currency, Money, UserId};

use domain_expenses::{
    summarize, AuditEntry, ClaimDetails, ClaimError, ClaimEvent, ClaimStatus, ExpenseClaim,
    NewReceipt, Receipt, RejectionReason,
};

fn myr(amount: Decimal) -> Money {
    Money::new(amount, Currency::MYR)
}

fn draft(owner: UserId, total: Decimal) -> ExpenseClaim {
    ExpenseClaim::draft(owner, ClaimDetails::new("Site visit", myr(total))).unwrap()
}

// ============================================================================
// Aggregate Tests
// ============================================================================

mod aggregate_tests {
    use super::*;

    #[test]
    fn test_new_draft() {
        let owner = UserId::new();
        let claim = draft(owner, dec!(120.00));

        assert_eq!(claim.status, ClaimStatus::Draft);
        assert_eq!(claim.created_by, owner);
        assert!(claim.submitted_at.is_none());
        assert!(claim.check_invariants().is_ok());
    }

    #[test]
    fn test_draft_requires_title() {
        let result = ExpenseClaim::draft(UserId::new(), ClaimDetails::new("   ", myr(dec!(10))));
        assert!(matches!(result, Err(ClaimError::Validation(_))));
    }

    #[test]
    fn test_draft_rejects_negative_amount() {
        let result = ExpenseClaim::draft(UserId::new(), ClaimDetails::new("Fuel", myr(dec!(-1))));
        assert!(matches!(result, Err(ClaimError::Validation(_))));
    }

    #[test]
    fn test_zero_amount_allowed() {
        let claim = draft(UserId::new(), dec!(0));
        assert!(claim.total_amount.is_zero());
    }

    #[test]
    fn test_submit_only_by_owner() {
        let owner = UserId::new();
        let mut claim = draft(owner, dec!(50));

        let result = claim.submit(UserId::new(), Utc::now());
        assert!(matches!(result, Err(ClaimError::Unauthorized(_))));
        assert_eq!(claim.status, ClaimStatus::Draft);

        let transition = claim.submit(owner, Utc::now()).unwrap();
        assert_eq!(transition.event, ClaimEvent::Submit);
        assert_eq!(claim.status, ClaimStatus::Pending);
        assert!(claim.submitted_at.is_some());
    }

    #[test]
    fn test_reject_records_reason() {
        let owner = UserId::new();
        let approver = UserId::new();
        let mut claim = draft(owner, dec!(50));
        claim.submit(owner, Utc::now()).unwrap();

        let reason = RejectionReason::parse("Missing receipt").unwrap();
        let transition = claim.reject(approver, reason, Utc::now()).unwrap();

        assert_eq!(transition.to, ClaimStatus::Rejected);
        assert_eq!(claim.rejection_reason.as_deref(), Some("Missing receipt"));
        assert_eq!(claim.rejected_by, Some(approver));
        assert!(claim.approved_at.is_none());
        assert!(claim.check_invariants().is_ok());
    }

    #[test]
    fn test_terminal_claims_do_not_move() {
        let owner = UserId::new();
        let approver = UserId::new();
        let mut claim = draft(owner, dec!(50));
        claim.submit(owner, Utc::now()).unwrap();
        claim.approve(approver, Utc::now()).unwrap();

        let again = claim.approve(approver, Utc::now());
        assert!(matches!(again, Err(ClaimError::InvalidStatusTransition { .. })));
        let reject = claim.reject(approver, RejectionReason::parse("late").unwrap(), Utc::now());
        assert!(reject.is_err());
        assert_eq!(claim.status, ClaimStatus::Approved);
    }

    #[test]
    fn test_edit_blocked_after_submit() {
        let owner = UserId::new();
        let mut claim = draft(owner, dec!(50));
        claim.submit(owner, Utc::now()).unwrap();

        let result = claim.edit_details(owner, ClaimDetails::new("Changed", myr(dec!(60))));
        assert!(matches!(result, Err(ClaimError::Conflict(_))));
    }

    #[test]
    fn test_edit_cannot_change_currency() {
        let owner = UserId::new();
        let mut claim = draft(owner, dec!(50));
        let result = claim.edit_details(
            owner,
            ClaimDetails::new("Site visit", Money::new(dec!(50), Currency::SGD)),
        );
        assert!(matches!(result, Err(ClaimError::Validation(_))));
    }

    #[test]
    fn test_invariants_catch_inconsistent_fields() {
        let mut claim = draft(UserId::new(), dec!(50));
        claim.approved_by = Some(UserId::new());
        assert!(claim.check_invariants().is_err());
    }

    #[test]
    fn test_audit_entry_from_transition() {
        let owner = UserId::new();
        let mut claim = draft(owner, dec!(50));
        let transition = claim.submit(owner, Utc::now()).unwrap();

        let entry = AuditEntry::from(&transition);
        assert_eq!(entry.claim_id, claim.id);
        assert_eq!(entry.from_status, ClaimStatus::Draft);
        assert_eq!(entry.to_status, ClaimStatus::Pending);
        assert_eq!(entry.actor, owner);
        assert!(entry.reason.is_none());
    }

    #[test]
    fn test_rejection_reason_deserialization_rejects_blank() {
        let result: Result<RejectionReason, _> = serde_json::from_str("\"  \"");
        assert!(result.is_err());
    }
}

// ============================================================================
// Summary Tests
// ============================================================================

mod summary_tests {
    use super::*;

    #[test]
    fn test_summary_display_strings() {
        let owner = UserId::new();
        let claim = draft(owner, dec!(1234.5));
        let receipt = Receipt::attach(
            &claim,
            owner,
            NewReceipt::new(
                myr(dec!(1234.5)),
                NaiveDate::from_ymd_opt(2024, 1, 9).unwrap(),
                "Hotel Seri",
            ),
        )
        .unwrap();

        let summary = summarize(&claim, &[receipt]).unwrap();

        assert_eq!(summary.claimed_total_display, "RM 1,234.50");
        assert_eq!(summary.lines[0].amount_display, "RM 1,234.50");
        assert_eq!(summary.lines[0].date_display, "09 Jan 2024");
        assert!(summary.is_balanced());
    }
}

// ============================================================================
// Property Tests
// ============================================================================

fn arb_event() -> impl Strategy<Value = ClaimEvent> {
    prop_oneof![
        Just(ClaimEvent::Submit),
        Just(ClaimEvent::Approve),
        Just(ClaimEvent::Reject),
    ]
}

proptest! {
    /// Any sequence of events keeps the decision fields consistent with the status
    #[test]
    fn prop_invariants_hold_for_any_event_sequence(
        events in proptest::collection::vec((arb_event(), any::<bool>()), 0..12)
    ) {
        let owner = UserId::new();
        let approver = UserId::new();
        let mut claim = draft(owner, dec!(75));

        for (event, by_owner) in events {
            let actor = if by_owner { owner } else { approver };
            let before = claim.status;
            let result = match event {
                ClaimEvent::Submit => claim.submit(actor, Utc::now()),
                ClaimEvent::Approve => claim.approve(actor, Utc::now()),
                ClaimEvent::Reject => claim.reject(
                    actor,
                    RejectionReason::parse("not itemised").unwrap(),
                    Utc::now(),
                ),
            };

            match result {
                Ok(transition) => {
                    prop_assert_eq!(transition.from, before);
                    prop_assert_eq!(transition.to, before.on(event).unwrap());
                }
                Err(_) => prop_assert_eq!(claim.status, before),
            }
            if before.is_terminal() {
                prop_assert_eq!(claim.status, before);
            }
            prop_assert!(claim.check_invariants().is_ok());
        }
    }

    /// The owner never ends up as the approver or rejecter
    #[test]
    fn prop_owner_never_decides(events in proptest::collection::vec(arb_event(), 0..8)) {
        let owner = UserId::new();
        let mut claim = draft(owner, dec!(10));
        for event in events {
            let _ = match event {
                ClaimEvent::Submit => claim.submit(owner, Utc::now()),
                ClaimEvent::Approve => claim.approve(owner, Utc::now()),
                ClaimEvent::Reject => claim.reject(
                    owner,
                    RejectionReason::parse("self").unwrap(),
                    Utc::now(),
                ),
            };
        }
        prop_assert_ne!(claim.approved_by, Some(owner));
        prop_assert_ne!(claim.rejected_by, Some(owner));
    }

    /// The receipts total is the sum of the claim's own receipt amounts
    #[test]
    fn prop_summary_total_matches_sum(cents in proptest::collection::vec(0i64..500_000i64, 0..15)) {
        let owner = UserId::new();
        let expected: i64 = cents.iter().sum();
        let claim = draft(owner, Decimal::new(expected, 2));
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

        let receipts: Vec<Receipt> = cents
            .iter()
            .map(|c| {
                Receipt::attach(&claim, owner, NewReceipt::new(myr(Decimal::new(*c, 2)), date, "Vendor"))
                    .unwrap()
            })
            .collect();

        let summary = summarize(&claim, &receipts).unwrap();
        prop_assert_eq!(summary.receipt_count, receipts.len());
        prop_assert_eq!(summary.receipts_total.amount(), Decimal::new(expected, 2));
        prop_assert!(summary.is_balanced());
    }
}
