//! Claims DTOs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use core_kernel::{ClaimId, Currency, Money, ProjectId, UserId};
use domain_expenses::{ClaimDetails, ClaimQuery, ClaimStatus, ExpenseClaim, NewReceipt, Receipt};

use super::{currency_or, validate_non_negative};
use crate::error::ApiError;

/// Largest page a client may request
pub const MAX_PAGE_SIZE: u32 = 200;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateClaimRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(custom(function = "validate_non_negative"))]
    pub amount: Decimal,
    pub currency: Option<String>,
    pub project_id: Option<Uuid>,
    /// Submit for approval straight away
    #[serde(default)]
    pub submit: bool,
}

impl CreateClaimRequest {
    pub fn into_details(self, default_currency: Currency) -> Result<ClaimDetails, ApiError> {
        let currency = currency_or(self.currency.as_deref(), default_currency)?;
        Ok(details(self.title, self.description, Money::new(self.amount, currency), self.project_id))
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateClaimRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(custom(function = "validate_non_negative"))]
    pub amount: Decimal,
    pub project_id: Option<Uuid>,
}

impl UpdateClaimRequest {
    /// Details in the currency of the existing claim
    pub fn into_details(self, currency: Currency) -> ClaimDetails {
        details(self.title, self.description, Money::new(self.amount, currency), self.project_id)
    }
}

fn details(title: String, description: Option<String>, amount: Money, project_id: Option<Uuid>) -> ClaimDetails {
    let mut details = ClaimDetails::new(title, amount);
    if let Some(description) = description {
        details = details.with_description(description);
    }
    if let Some(project_id) = project_id {
        details = details.for_project(ProjectId::from_uuid(project_id));
    }
    details
}

#[derive(Debug, Deserialize, Validate)]
pub struct AttachReceiptRequest {
    #[validate(custom(function = "validate_non_negative"))]
    pub amount: Decimal,
    pub currency: Option<String>,
    pub receipt_date: NaiveDate,
    #[validate(length(min = 1, max = 200))]
    pub vendor: String,
    pub description: Option<String>,
    /// URL or storage key of the scanned receipt
    #[validate(length(max = 1000))]
    pub file_ref: Option<String>,
}

impl AttachReceiptRequest {
    pub fn into_new_receipt(self, default_currency: Currency) -> Result<NewReceipt, ApiError> {
        let currency = currency_or(self.currency.as_deref(), default_currency)?;
        let mut receipt = NewReceipt::new(Money::new(self.amount, currency), self.receipt_date, self.vendor);
        if let Some(description) = self.description {
            receipt = receipt.with_description(description);
        }
        if let Some(file_ref) = self.file_ref {
            receipt = receipt.with_file_ref(file_ref);
        }
        Ok(receipt)
    }
}

/// Reject body; the reason is validated by the domain
#[derive(Debug, Deserialize)]
pub struct RejectClaimRequest {
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListClaimsParams {
    pub owner: Option<Uuid>,
    pub status: Option<String>,
    pub project_id: Option<Uuid>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl ListClaimsParams {
    pub fn into_query(self) -> Result<ClaimQuery, ApiError> {
        let status = self
            .status
            .as_deref()
            .map(str::parse::<ClaimStatus>)
            .transpose()?;
        Ok(ClaimQuery {
            created_by: self.owner.map(UserId::from_uuid),
            status,
            project_id: self.project_id.map(ProjectId::from_uuid),
            limit: Some(self.limit.unwrap_or(50).min(MAX_PAGE_SIZE)),
            offset: self.offset,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ClaimResponse {
    pub id: ClaimId,
    pub title: String,
    pub description: Option<String>,
    pub status: ClaimStatus,
    pub total_amount: Decimal,
    pub currency: Currency,
    pub amount_display: String,
    pub created_by: UserId,
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

impl From<ExpenseClaim> for ClaimResponse {
    fn from(claim: ExpenseClaim) -> Self {
        Self {
            id: claim.id,
            amount_display: claim.total_amount.format_display(),
            total_amount: claim.total_amount.amount(),
            currency: claim.total_amount.currency(),
            title: claim.title,
            description: claim.description,
            status: claim.status,
            created_by: claim.created_by,
            project_id: claim.project_id,
            submitted_at: claim.submitted_at,
            approved_at: claim.approved_at,
            approved_by: claim.approved_by,
            rejected_at: claim.rejected_at,
            rejected_by: claim.rejected_by,
            rejection_reason: claim.rejection_reason,
            created_at: claim.created_at,
            updated_at: claim.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReceiptResponse {
    pub id: core_kernel::ReceiptId,
    pub claim_id: ClaimId,
    pub amount: Decimal,
    pub currency: Currency,
    pub receipt_date: NaiveDate,
    pub vendor: String,
    pub description: Option<String>,
    pub file_ref: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

impl From<Receipt> for ReceiptResponse {
    fn from(receipt: Receipt) -> Self {
        Self {
            id: receipt.id,
            claim_id: receipt.claim_id,
            amount: receipt.amount.amount(),
            currency: receipt.amount.currency(),
            receipt_date: receipt.receipt_date,
            vendor: receipt.vendor,
            description: receipt.description,
            file_ref: receipt.file_ref,
            uploaded_at: receipt.uploaded_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CanApproveResponse {
    pub claim_id: ClaimId,
    pub can_approve: bool,
}
