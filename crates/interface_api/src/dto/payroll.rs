//! Payroll DTOs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use core_kernel::{CandidateId, Currency, Money, PayrollEntryId, ProjectId};
use domain_payroll::{PayrollUpdate, WorkingDay};

use super::{currency_or, validate_non_negative};
use crate::error::ApiError;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct WorkingDayRequest {
    pub date: NaiveDate,
    #[validate(custom(function = "validate_non_negative"))]
    pub basic_pay: Decimal,
    #[serde(default)]
    #[validate(custom(function = "validate_non_negative"))]
    pub claims: Decimal,
    #[serde(default)]
    #[validate(custom(function = "validate_non_negative"))]
    pub allowance: Decimal,
    #[serde(default)]
    #[validate(custom(function = "validate_non_negative"))]
    pub commission: Decimal,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReconcilePayrollRequest {
    pub project_id: Uuid,
    pub candidate_id: Uuid,
    /// Existing project staff entry, when the caller knows it
    pub staff_entry_id: Option<Uuid>,
    pub currency: Option<String>,
    #[validate(length(min = 1, max = 62))]
    #[validate(nested)]
    pub working_days: Vec<WorkingDayRequest>,
}

impl ReconcilePayrollRequest {
    pub fn into_update(self, default_currency: Currency) -> Result<PayrollUpdate, ApiError> {
        let currency = currency_or(self.currency.as_deref(), default_currency)?;
        let money = |amount: Decimal| Money::new(amount, currency);

        let mut update = PayrollUpdate::new(
            ProjectId::from_uuid(self.project_id),
            CandidateId::from_uuid(self.candidate_id),
            currency,
        );
        if let Some(entry_id) = self.staff_entry_id {
            update = update.for_entry(PayrollEntryId::from_uuid(entry_id));
        }
        for day in self.working_days {
            update = update.with_day(
                WorkingDay::basic(day.date, money(day.basic_pay))
                    .with_claims(money(day.claims))
                    .with_allowance(money(day.allowance))
                    .with_commission(money(day.commission)),
            );
        }
        Ok(update)
    }
}
