//! Read-only receipt aggregation for a claim
//!
//! Recomputed from the receipt list on every call; nothing is cached.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use core_kernel::{ClaimId, Money, ReceiptId};
use crate::claim::ExpenseClaim;
use crate::error::ClaimError;
use crate::receipt::Receipt;

const DATE_DISPLAY_FORMAT: &str = "%d %b %Y";

/// One display line per receipt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptLine {
    pub receipt_id: ReceiptId,
    pub vendor: String,
    pub amount: Money,
    pub amount_display: String,
    pub date_display: String,
    pub file_ref: Option<String>,
}

/// Summary of a claim's receipts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptSummary {
    pub claim_id: ClaimId,
    pub receipt_count: usize,
    pub receipts_total: Money,
    pub claimed_total: Money,
    /// Claimed total minus receipts total, when they differ
    pub discrepancy: Option<Money>,
    pub receipts_total_display: String,
    pub claimed_total_display: String,
    pub earliest_receipt: Option<NaiveDate>,
    pub latest_receipt: Option<NaiveDate>,
    pub lines: Vec<ReceiptLine>,
}

impl ReceiptSummary {
    /// True when the receipts add up to the claimed total
    pub fn is_balanced(&self) -> bool {
        self.discrepancy.is_none()
    }
}

/// Summarizes `receipts` for `claim`
///
/// Receipts that belong to another claim are ignored. Lines are ordered by
/// receipt date, then vendor.
pub fn summarize(claim: &ExpenseClaim, receipts: &[Receipt]) -> Result<ReceiptSummary, ClaimError> {
    let mut own: Vec<&Receipt> = receipts.iter().filter(|r| r.claim_id == claim.id).collect();
    own.sort_by(|a, b| {
        a.receipt_date
            .cmp(&b.receipt_date)
            .then_with(|| a.vendor.cmp(&b.vendor))
    });

    let receipts_total = Money::sum(own.iter().copied().map(|r| &r.amount), claim.currency())?;
    let difference = claim.total_amount.checked_sub(&receipts_total)?;
    let discrepancy = if difference.round_to_currency().is_zero() {
        None
    } else {
        Some(difference)
    };

    let lines = own
        .iter()
        .map(|r| ReceiptLine {
            receipt_id: r.id,
            vendor: r.vendor.clone(),
            amount: r.amount,
            amount_display: r.amount.format_display(),
            date_display: r.receipt_date.format(DATE_DISPLAY_FORMAT).to_string(),
            file_ref: r.file_ref.clone(),
        })
        .collect();

    Ok(ReceiptSummary {
        claim_id: claim.id,
        receipt_count: own.len(),
        receipts_total,
        claimed_total: claim.total_amount,
        discrepancy,
        receipts_total_display: receipts_total.format_display(),
        claimed_total_display: claim.total_amount.format_display(),
        earliest_receipt: own.first().map(|r| r.receipt_date),
        latest_receipt: own.last().map(|r| r.receipt_date),
        lines,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claim::ClaimDetails;
    use chrono::Utc;
    use core_kernel::{Currency, UserId};
    use rust_decimal_macros::dec;

    fn claim(total: Money) -> ExpenseClaim {
        ExpenseClaim::draft(UserId::new(), ClaimDetails::new("Event supplies", total)).unwrap()
    }

    fn receipt(claim_id: ClaimId, amount: Money, day: u32, vendor: &str) -> Receipt {
        Receipt {
            id: ReceiptId::new(),
            claim_id,
            amount,
            receipt_date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            vendor: vendor.to_string(),
            description: None,
            file_ref: None,
            uploaded_at: Utc::now(),
        }
    }

    #[test]
    fn test_empty_receipts() {
        let c = claim(Money::zero(Currency::MYR));
        let summary = summarize(&c, &[]).unwrap();
        assert_eq!(summary.receipt_count, 0);
        assert!(summary.is_balanced());
        assert_eq!(summary.receipts_total_display, "RM 0.00");
        assert!(summary.earliest_receipt.is_none());
    }

    #[test]
    fn test_balanced_claim() {
        let c = claim(Money::new(dec!(1250.50), Currency::MYR));
        let receipts = vec![
            receipt(c.id, Money::new(dec!(1000), Currency::MYR), 12, "Hotel"),
            receipt(c.id, Money::new(dec!(250.50), Currency::MYR), 5, "Grab"),
        ];

        let summary = summarize(&c, &receipts).unwrap();

        assert_eq!(summary.receipt_count, 2);
        assert!(summary.is_balanced());
        assert_eq!(summary.receipts_total_display, "RM 1,250.50");
        assert_eq!(summary.lines[0].vendor, "Grab");
        assert_eq!(summary.lines[0].date_display, "05 Mar 2024");
        assert_eq!(summary.latest_receipt, NaiveDate::from_ymd_opt(2024, 3, 12));
    }

    #[test]
    fn test_discrepancy_reported() {
        let c = claim(Money::new(dec!(100), Currency::MYR));
        let receipts = vec![receipt(c.id, Money::new(dec!(60), Currency::MYR), 1, "Shop")];

        let summary = summarize(&c, &receipts).unwrap();
        assert_eq!(summary.discrepancy, Some(Money::new(dec!(40), Currency::MYR)));
    }

    #[test]
    fn test_foreign_receipts_ignored() {
        let c = claim(Money::new(dec!(10), Currency::MYR));
        let receipts = vec![
            receipt(c.id, Money::new(dec!(10), Currency::MYR), 1, "Shop"),
            receipt(ClaimId::new(), Money::new(dec!(99), Currency::MYR), 2, "Other"),
        ];
        let summary = summarize(&c, &receipts).unwrap();
        assert_eq!(summary.receipt_count, 1);
        assert!(summary.is_balanced());
    }

    #[test]
    fn test_currency_mismatch_is_error() {
        let c = claim(Money::new(dec!(10), Currency::MYR));
        let receipts = vec![receipt(c.id, Money::new(dec!(10), Currency::SGD), 1, "Shop")];
        assert!(matches!(summarize(&c, &receipts), Err(ClaimError::Money(_))));
    }
}
