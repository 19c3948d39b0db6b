//! Custom Test Assertions
//!
//! Provides specialized assertion helpers for domain types that give
//! more meaningful error messages than standard assertions.

use core_kernel::Money;
use domain_expenses::{ClaimError, ClaimErrorKind, ClaimStatus, ExpenseClaim, ReceiptSummary};
use domain_payroll::{AttemptOutcome, Reconciliation};
use rust_decimal::Decimal;

/// Asserts that two Money values have the same currency and amount
pub fn assert_money_eq(actual: &Money, expected: &Money) {
    assert_eq!(
        actual.currency(),
        expected.currency(),
        "Currency mismatch: actual={}, expected={}",
        actual.currency(),
        expected.currency()
    );
    assert_eq!(
        actual.amount(),
        expected.amount(),
        "Amount mismatch: actual={}, expected={}",
        actual.format_display(),
        expected.format_display()
    );
}

/// Asserts that two Money values are approximately equal within a tolerance
///
/// # Panics
///
/// Panics if the currencies don't match or the amounts differ by more than tolerance
pub fn assert_money_approx_eq(actual: &Money, expected: &Money, tolerance: Decimal) {
    assert_eq!(actual.currency(), expected.currency(), "Currency mismatch");

    let diff = (actual.amount() - expected.amount()).abs();
    assert!(
        diff <= tolerance,
        "Money amounts differ by more than tolerance: actual={}, expected={}, diff={}, tolerance={}",
        actual.amount(),
        expected.amount(),
        diff,
        tolerance
    );
}

/// Asserts that a claim has the expected status and consistent decision fields
pub fn assert_claim_status(claim: &ExpenseClaim, expected: ClaimStatus) {
    assert_eq!(
        claim.status, expected,
        "Claim {} has status {}, expected {}",
        claim.id, claim.status, expected
    );
    assert_claim_invariants(claim);
}

/// Asserts that the claim's decision fields agree with its status
pub fn assert_claim_invariants(claim: &ExpenseClaim) {
    if let Err(e) = claim.check_invariants() {
        panic!("Claim {} violates its invariants: {}", claim.id, e);
    }
}

/// Asserts that a result failed with an error of the given kind
pub fn assert_claim_error_kind<T: std::fmt::Debug>(result: &Result<T, ClaimError>, expected: ClaimErrorKind) {
    match result {
        Ok(value) => panic!("Expected {:?} error, got Ok({:?})", expected, value),
        Err(e) => assert_eq!(
            e.kind(),
            expected,
            "Expected {:?} error, got {:?}: {}",
            expected,
            e.kind(),
            e
        ),
    }
}

/// Asserts that a summary's receipt lines add up to its receipts total
pub fn assert_summary_consistent(summary: &ReceiptSummary) {
    assert_eq!(summary.receipt_count, summary.lines.len());
    let sum = Money::sum(summary.lines.iter().map(|l| &l.amount), summary.receipts_total.currency())
        .expect("summary lines share the claim currency");
    assert_money_eq(&sum, &summary.receipts_total);
    assert_eq!(summary.is_balanced(), summary.receipts_total == summary.claimed_total);
}

/// Asserts which strategies a reconciliation tried, in order
pub fn assert_attempted(reconciliation: &Reconciliation, expected: &[&str]) {
    let tried: Vec<&str> = reconciliation
        .attempts
        .iter()
        .map(|a| a.strategy.as_str())
        .collect();
    assert_eq!(tried, expected, "Unexpected strategy order");
    let last = reconciliation.attempts.last().expect("at least one attempt");
    assert!(
        matches!(last.outcome, AttemptOutcome::Applied),
        "Last attempt should be applied, got {:?}",
        last.outcome
    );
    assert_eq!(last.strategy, reconciliation.applied_by);
}
