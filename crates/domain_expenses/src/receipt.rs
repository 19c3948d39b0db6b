//! Receipts attached to expense claims

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{ClaimId, Money, ReceiptId, UserId};
use crate::claim::ExpenseClaim;
use crate::error::ClaimError;

/// Evidence for part of a claim. Immutable once attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub id: ReceiptId,
    pub claim_id: ClaimId,
    pub amount: Money,
    pub receipt_date: NaiveDate,
    pub vendor: String,
    pub description: Option<String>,
    /// URL or storage identifier of the scanned receipt
    pub file_ref: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

/// Receipt data supplied by the claim owner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReceipt {
    pub amount: Money,
    pub receipt_date: NaiveDate,
    pub vendor: String,
    pub description: Option<String>,
    pub file_ref: Option<String>,
}

impl NewReceipt {
    pub fn new(amount: Money, receipt_date: NaiveDate, vendor: impl Into<String>) -> Self {
        Self {
            amount,
            receipt_date,
            vendor: vendor.into(),
            description: None,
            file_ref: None,
        }
    }

    pub fn with_file_ref(mut self, file_ref: impl Into<String>) -> Self {
        self.file_ref = Some(file_ref.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl Receipt {
    /// Builds a receipt for a draft claim owned by `actor`
    pub fn attach(claim: &ExpenseClaim, actor: UserId, new: NewReceipt) -> Result<Self, ClaimError> {
        claim.ensure_editable_by(actor)?;

        let vendor = new.vendor.trim().to_string();
        if vendor.is_empty() {
            return Err(ClaimError::validation("receipt vendor is required"));
        }
        if new.amount.is_negative() {
            return Err(ClaimError::validation("receipt amount cannot be negative"));
        }
        if new.amount.currency() != claim.currency() {
            return Err(ClaimError::validation(format!(
                "receipt currency {} does not match claim currency {}",
                new.amount.currency(),
                claim.currency()
            )));
        }

        Ok(Self {
            id: ReceiptId::new_v7(),
            claim_id: claim.id,
            amount: new.amount,
            receipt_date: new.receipt_date,
            vendor,
            description: new.description.filter(|d| !d.trim().is_empty()),
            file_ref: new.file_ref.filter(|f| !f.trim().is_empty()),
            uploaded_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claim::ClaimDetails;
    use core_kernel::Currency;
    use rust_decimal_macros::dec;

    fn draft(owner: UserId) -> ExpenseClaim {
        ExpenseClaim::draft(
            owner,
            ClaimDetails::new("Crew meals", Money::new(dec!(80), Currency::MYR)),
        )
        .unwrap()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
    }

    #[test]
    fn test_attach_to_own_draft() {
        let owner = UserId::new();
        let claim = draft(owner);
        let receipt = Receipt::attach(
            &claim,
            owner,
            NewReceipt::new(Money::new(dec!(40), Currency::MYR), date(), "  Mamak Corner ")
                .with_file_ref("receipts/abc.jpg"),
        )
        .unwrap();

        assert_eq!(receipt.claim_id, claim.id);
        assert_eq!(receipt.vendor, "Mamak Corner");
        assert_eq!(receipt.file_ref.as_deref(), Some("receipts/abc.jpg"));
    }

    #[test]
    fn test_attach_rejects_other_user() {
        let claim = draft(UserId::new());
        let result = Receipt::attach(
            &claim,
            UserId::new(),
            NewReceipt::new(Money::new(dec!(40), Currency::MYR), date(), "Vendor"),
        );
        assert!(matches!(result, Err(ClaimError::Unauthorized(_))));
    }

    #[test]
    fn test_attach_rejects_currency_mismatch() {
        let owner = UserId::new();
        let claim = draft(owner);
        let result = Receipt::attach(
            &claim,
            owner,
            NewReceipt::new(Money::new(dec!(40), Currency::SGD), date(), "Vendor"),
        );
        assert!(matches!(result, Err(ClaimError::Validation(_))));
    }

    #[test]
    fn test_attach_rejects_blank_vendor() {
        let owner = UserId::new();
        let claim = draft(owner);
        let result = Receipt::attach(
            &claim,
            owner,
            NewReceipt::new(Money::new(dec!(40), Currency::MYR), date(), "   "),
        );
        assert!(matches!(result, Err(ClaimError::Validation(_))));
    }
}
