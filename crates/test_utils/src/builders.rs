//! Test Data Builders
//!
//! Provides builder patterns for constructing test data with sensible defaults.
//! Claims are built by driving the aggregate through its real transitions, so
//! a built claim always satisfies the status invariants.

use chrono::{DateTime, NaiveDate, Utc};
use core_kernel::{CandidateId, Currency, Money, PayrollEntryId, ProjectId, UserId};
use domain_expenses::{
    ClaimDetails, ClaimStatus, ExpenseClaim, NewReceipt, Receipt, RejectionReason,
};
use domain_payroll::{PayrollUpdate, WorkingDay};
use rust_decimal::Decimal;

use crate::fixtures::{IdFixtures, MoneyFixtures, StringFixtures, TemporalFixtures};

/// Builder for expense claims in any lifecycle status
pub struct ExpenseClaimBuilder {
    owner: UserId,
    title: String,
    description: Option<String>,
    amount: Money,
    project_id: Option<ProjectId>,
    status: ClaimStatus,
    decided_by: UserId,
    rejection_reason: String,
}

impl Default for ExpenseClaimBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpenseClaimBuilder {
    /// Creates a builder for a MYR 100 draft owned by the fixture crew member
    pub fn new() -> Self {
        Self {
            owner: IdFixtures::crew_member(),
            title: StringFixtures::claim_title().to_string(),
            description: None,
            amount: MoneyFixtures::myr_100(),
            project_id: None,
            status: ClaimStatus::Draft,
            decided_by: IdFixtures::approver(),
            rejection_reason: StringFixtures::rejection_reason().to_string(),
        }
    }

    pub fn owned_by(mut self, owner: UserId) -> Self {
        self.owner = owner;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_amount(mut self, amount: Money) -> Self {
        self.amount = amount;
        self
    }

    pub fn for_project(mut self, project_id: ProjectId) -> Self {
        self.project_id = Some(project_id);
        self
    }

    pub fn pending(mut self) -> Self {
        self.status = ClaimStatus::Pending;
        self
    }

    /// Approved by `approver`
    pub fn approved_by(mut self, approver: UserId) -> Self {
        self.status = ClaimStatus::Approved;
        self.decided_by = approver;
        self
    }

    /// Rejected by `approver` with `reason`
    pub fn rejected_by(mut self, approver: UserId, reason: impl Into<String>) -> Self {
        self.status = ClaimStatus::Rejected;
        self.decided_by = approver;
        self.rejection_reason = reason.into();
        self
    }

    /// Details as the owner would submit them
    pub fn details(&self) -> ClaimDetails {
        let mut details = ClaimDetails::new(self.title.clone(), self.amount);
        if let Some(description) = &self.description {
            details = details.with_description(description.clone());
        }
        if let Some(project_id) = self.project_id {
            details = details.for_project(project_id);
        }
        details
    }

    /// Builds the claim
    ///
    /// # Panics
    ///
    /// Panics if the configured data violates a claim rule, for example a
    /// blank title or an owner deciding their own claim.
    pub fn build(self) -> ExpenseClaim {
        let mut claim = ExpenseClaim::draft(self.owner, self.details())
            .expect("builder produced invalid claim details");
        if self.status == ClaimStatus::Draft {
            return claim;
        }

        claim
            .submit(self.owner, TemporalFixtures::submitted_at())
            .expect("draft should submit");

        match self.status {
            ClaimStatus::Approved => {
                claim
                    .approve(self.decided_by, TemporalFixtures::decided_at())
                    .expect("pending claim should approve");
            }
            ClaimStatus::Rejected => {
                let reason = RejectionReason::parse(&self.rejection_reason)
                    .expect("builder rejection reason must not be blank");
                claim
                    .reject(self.decided_by, reason, TemporalFixtures::decided_at())
                    .expect("pending claim should reject");
            }
            _ => {}
        }
        claim
    }
}

/// Builder for receipts
pub struct ReceiptBuilder {
    amount: Money,
    receipt_date: NaiveDate,
    vendor: String,
    description: Option<String>,
    file_ref: Option<String>,
}

impl Default for ReceiptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReceiptBuilder {
    pub fn new() -> Self {
        Self {
            amount: MoneyFixtures::myr_100(),
            receipt_date: TemporalFixtures::receipt_date(),
            vendor: StringFixtures::vendor().to_string(),
            description: None,
            file_ref: Some(StringFixtures::receipt_file_ref().to_string()),
        }
    }

    pub fn with_amount(mut self, amount: Money) -> Self {
        self.amount = amount;
        self
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.receipt_date = date;
        self
    }

    pub fn from_vendor(mut self, vendor: impl Into<String>) -> Self {
        self.vendor = vendor.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn without_file(mut self) -> Self {
        self.file_ref = None;
        self
    }

    /// Builds the owner-supplied receipt data
    pub fn build(self) -> NewReceipt {
        let mut receipt = NewReceipt::new(self.amount, self.receipt_date, self.vendor);
        if let Some(description) = self.description {
            receipt = receipt.with_description(description);
        }
        if let Some(file_ref) = self.file_ref {
            receipt = receipt.with_file_ref(file_ref);
        }
        receipt
    }

    /// Attaches the receipt to a draft claim on behalf of its owner
    ///
    /// # Panics
    ///
    /// Panics if the claim is not a draft or the receipt is invalid for it.
    pub fn attach_to(self, claim: &ExpenseClaim) -> Receipt {
        Receipt::attach(claim, claim.created_by, self.build())
            .expect("receipt should attach to draft claim")
    }

    /// Attaches the receipt with a fixed upload time
    pub fn attach_at(self, claim: &ExpenseClaim, uploaded_at: DateTime<Utc>) -> Receipt {
        let mut receipt = self.attach_to(claim);
        receipt.uploaded_at = uploaded_at;
        receipt
    }
}

/// Builder for payroll updates
pub struct PayrollUpdateBuilder {
    project_id: ProjectId,
    candidate_id: CandidateId,
    entry_id: Option<PayrollEntryId>,
    currency: Currency,
    days: Vec<WorkingDay>,
}

impl Default for PayrollUpdateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PayrollUpdateBuilder {
    /// Creates an update for the fixture project and candidate with no days
    pub fn new() -> Self {
        Self {
            project_id: IdFixtures::project_id(),
            candidate_id: IdFixtures::candidate_id(),
            entry_id: None,
            currency: Currency::MYR,
            days: Vec::new(),
        }
    }

    pub fn for_project(mut self, project_id: ProjectId) -> Self {
        self.project_id = project_id;
        self
    }

    pub fn for_candidate(mut self, candidate_id: CandidateId) -> Self {
        self.candidate_id = candidate_id;
        self
    }

    pub fn with_entry(mut self, entry_id: PayrollEntryId) -> Self {
        self.entry_id = Some(entry_id);
        self
    }

    pub fn with_day(mut self, day: WorkingDay) -> Self {
        self.days.push(day);
        self
    }

    /// Adds `count` consecutive days at the fixture day rate
    pub fn with_standard_days(mut self, count: u32) -> Self {
        for date in TemporalFixtures::shoot_days(count) {
            self.days.push(WorkingDay::basic(date, MoneyFixtures::myr_day_rate()));
        }
        self
    }

    /// Adds a day with every pay component set
    pub fn with_full_day(mut self, date: NaiveDate, basic: Decimal, claims: Decimal, allowance: Decimal, commission: Decimal) -> Self {
        let currency = self.currency;
        self.days.push(
            WorkingDay::basic(date, Money::new(basic, currency))
                .with_claims(Money::new(claims, currency))
                .with_allowance(Money::new(allowance, currency))
                .with_commission(Money::new(commission, currency)),
        );
        self
    }

    pub fn build(self) -> PayrollUpdate {
        let mut update = PayrollUpdate::new(self.project_id, self.candidate_id, self.currency);
        if let Some(entry_id) = self.entry_id {
            update = update.for_entry(entry_id);
        }
        for day in self.days {
            update = update.with_day(day);
        }
        update
    }
}
