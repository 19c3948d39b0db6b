//! Tests for the payroll reconciliation chain

use std::sync::Arc;

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal_macros::dec;

use core_kernel::{CandidateId, Currency, Money, PayrollEntryId, ProjectId};

use domain_payroll::mock::{InMemoryPayrollStore, InjectedFailure, StoreOperation};
use domain_payroll::{
    AttemptOutcome, FallthroughKind, PayrollError, PayrollReconciler, PayrollRecord,
    PayrollTarget, PayrollUpdate, WorkingDay,
};

fn myr(amount: rust_decimal::Decimal) -> Money {
    Money::new(amount, Currency::MYR)
}

fn update() -> PayrollUpdate {
    PayrollUpdate::new(ProjectId::new(), CandidateId::new(), Currency::MYR)
        .with_day(
            WorkingDay::basic(NaiveDate::from_ymd_opt(2024, 9, 14).unwrap(), myr(dec!(150)))
                .with_allowance(myr(dec!(20))),
        )
        .with_day(
            WorkingDay::basic(NaiveDate::from_ymd_opt(2024, 9, 15).unwrap(), myr(dec!(150)))
                .with_claims(myr(dec!(35.40))),
        )
}

fn reconciler(store: &Arc<InMemoryPayrollStore>) -> PayrollReconciler {
    PayrollReconciler::new(store.clone())
}

mod chain_tests {
    use super::*;

    #[test]
    fn test_default_order() {
        let store = Arc::new(InMemoryPayrollStore::new());
        assert_eq!(
            reconciler(&store).strategy_names(),
            vec!["procedure", "direct_update", "create_record", "candidate_record"]
        );
    }

    #[tokio::test]
    async fn test_procedure_applies_first() {
        let store = Arc::new(InMemoryPayrollStore::with_procedure());
        let result = reconciler(&store).reconcile(&update()).await.unwrap();

        assert_eq!(result.applied_by, "procedure");
        assert_eq!(result.attempts.len(), 1);
        assert_eq!(result.record.total.amount(), dec!(355.40));
        assert_eq!(result.record.target, PayrollTarget::ProjectStaff);
        assert_eq!(store.calls().await, vec![StoreOperation::Procedure]);
    }

    #[tokio::test]
    async fn test_direct_update_when_procedure_missing() {
        let store = Arc::new(InMemoryPayrollStore::new());
        let base = update();
        let entry_id = PayrollEntryId::new();
        let existing = PayrollRecord::from_update(&base, Some(entry_id), PayrollTarget::ProjectStaff)
            .unwrap();
        store.seed_entry(existing).await;

        let result = reconciler(&store)
            .reconcile(&base.clone().for_entry(entry_id))
            .await
            .unwrap();

        assert_eq!(result.applied_by, "direct_update");
        assert_eq!(
            result.attempts[0].outcome,
            AttemptOutcome::FellThrough {
                kind: FallthroughKind::Unsupported,
                message: "Unsupported operation: upsert_staff_payroll".to_string(),
            }
        );
        assert_eq!(result.record.entry_id, Some(entry_id));
    }

    #[tokio::test]
    async fn test_create_record_without_entry_id() {
        let store = Arc::new(InMemoryPayrollStore::new());
        let result = reconciler(&store).reconcile(&update()).await.unwrap();

        assert_eq!(result.applied_by, "create_record");
        assert!(matches!(
            result.attempts[1].outcome,
            AttemptOutcome::Skipped { .. }
        ));
        let entry_id = result.record.entry_id.unwrap();
        assert!(store.staff_entry(entry_id).await.is_some());
    }

    #[tokio::test]
    async fn test_candidate_record_as_last_resort() {
        let store = Arc::new(InMemoryPayrollStore::new());
        store
            .fail_on(StoreOperation::InsertStaffEntry, InjectedFailure::NotFound)
            .await;
        let base = update().for_entry(PayrollEntryId::new());

        let result = reconciler(&store).reconcile(&base).await.unwrap();

        assert_eq!(result.applied_by, "candidate_record");
        assert_eq!(result.attempts.len(), 4);
        assert_eq!(result.record.target, PayrollTarget::Candidate);
        assert!(store.candidate_record(base.candidate_id).await.is_some());
    }

    #[tokio::test]
    async fn test_exhausted_when_everything_falls_through() {
        let store = Arc::new(InMemoryPayrollStore::new());
        store
            .fail_on(StoreOperation::InsertStaffEntry, InjectedFailure::Conflict)
            .await;
        store
            .fail_on(StoreOperation::UpdateCandidate, InjectedFailure::NotFound)
            .await;

        let error = reconciler(&store).reconcile(&update()).await.unwrap_err();

        match error {
            PayrollError::Exhausted { attempts } => {
                assert_eq!(attempts.len(), 4);
                assert!(attempts.iter().all(|a| a.outcome != AttemptOutcome::Applied));
            }
            other => panic!("expected Exhausted, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_transient_failure_stops_chain() {
        let store = Arc::new(InMemoryPayrollStore::with_procedure());
        store
            .fail_on(StoreOperation::Procedure, InjectedFailure::Unavailable)
            .await;

        let error = reconciler(&store).reconcile(&update()).await.unwrap_err();

        assert!(error.is_transient());
        assert!(matches!(error, PayrollError::Aborted { ref strategy, .. } if strategy == "procedure"));
        assert_eq!(store.calls().await, vec![StoreOperation::Procedure]);
    }

    #[tokio::test]
    async fn test_unauthorized_failure_stops_chain() {
        let store = Arc::new(InMemoryPayrollStore::new());
        store
            .fail_on(StoreOperation::InsertStaffEntry, InjectedFailure::Unauthorized)
            .await;

        let error = reconciler(&store).reconcile(&update()).await.unwrap_err();

        assert!(!error.is_transient());
        assert_eq!(error.attempts().len(), 3);
        assert!(!store.calls().await.contains(&StoreOperation::UpdateCandidate));
    }

    #[tokio::test]
    async fn test_invalid_update_touches_nothing() {
        let store = Arc::new(InMemoryPayrollStore::with_procedure());
        let empty = PayrollUpdate::new(ProjectId::new(), CandidateId::new(), Currency::MYR);

        let error = reconciler(&store).reconcile(&empty).await.unwrap_err();

        assert!(matches!(error, PayrollError::Validation(_)));
        assert!(store.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_overflowing_total_is_rejected_before_any_write() {
        let store = Arc::new(InMemoryPayrollStore::with_procedure());
        let huge = myr(rust_decimal::Decimal::MAX);
        let update = PayrollUpdate::new(ProjectId::new(), CandidateId::new(), Currency::MYR).with_day(
            WorkingDay::basic(NaiveDate::from_ymd_opt(2024, 9, 14).unwrap(), huge).with_allowance(huge),
        );

        let error = reconciler(&store).reconcile(&update).await.unwrap_err();

        assert!(matches!(error, PayrollError::Money(core_kernel::MoneyError::Overflow)));
        assert!(store.calls().await.is_empty());
    }

    #[test]
    fn test_attempt_serialization() {
        let attempt = domain_payroll::Attempt {
            strategy: "direct_update".to_string(),
            outcome: AttemptOutcome::Skipped {
                reason: "no staff entry id".to_string(),
            },
        };
        let json = serde_json::to_value(&attempt).unwrap();
        assert_eq!(json["strategy"], "direct_update");
        assert_eq!(json["outcome"], "skipped");
    }
}

fn arb_fallthrough() -> impl Strategy<Value = Option<InjectedFailure>> {
    prop_oneof![
        Just(None),
        Just(Some(InjectedFailure::NotFound)),
        Just(Some(InjectedFailure::Conflict)),
        Just(Some(InjectedFailure::Unsupported)),
    ]
}

proptest! {
    /// With only fall-through failures the first healthy write path wins and
    /// nothing after it runs
    #[test]
    fn prop_first_healthy_strategy_applies(
        procedure in arb_fallthrough(),
        insert in arb_fallthrough(),
        candidate in arb_fallthrough(),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        runtime.block_on(async {
            let store = Arc::new(InMemoryPayrollStore::with_procedure());
            let plan = [
                (StoreOperation::Procedure, procedure, "procedure"),
                (StoreOperation::InsertStaffEntry, insert, "create_record"),
                (StoreOperation::UpdateCandidate, candidate, "candidate_record"),
            ];
            for (op, failure, _) in plan {
                if let Some(failure) = failure {
                    store.fail_on(op, failure).await;
                }
            }

            let expected = plan.iter().find(|(_, failure, _)| failure.is_none());
            let result = reconciler(&store).reconcile(&update()).await;

            match expected {
                Some((op, _, name)) => {
                    let reconciliation = result.unwrap();
                    assert_eq!(reconciliation.applied_by, *name);
                    assert_eq!(store.calls().await.last(), Some(op));
                }
                None => assert!(matches!(result, Err(PayrollError::Exhausted { .. }))),
            }
        });
    }
}
