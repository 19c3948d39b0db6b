//! Payroll model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use core_kernel::{CandidateId, Currency, Money, MoneyError, PayrollEntryId, ProjectId};
use crate::error::PayrollError;

/// Pay components for one working day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingDay {
    pub date: NaiveDate,
    pub basic_pay: Money,
    /// Reimbursed expense claims paid out with this day
    pub claims: Money,
    pub allowance: Money,
    pub commission: Money,
}

impl WorkingDay {
    /// A day with only basic pay
    pub fn basic(date: NaiveDate, basic_pay: Money) -> Self {
        let zero = Money::zero(basic_pay.currency());
        Self {
            date,
            basic_pay,
            claims: zero,
            allowance: zero,
            commission: zero,
        }
    }

    pub fn with_claims(mut self, claims: Money) -> Self {
        self.claims = claims;
        self
    }

    pub fn with_allowance(mut self, allowance: Money) -> Self {
        self.allowance = allowance;
        self
    }

    pub fn with_commission(mut self, commission: Money) -> Self {
        self.commission = commission;
        self
    }

    fn components(&self) -> [(&'static str, &Money); 4] {
        [
            ("basic_pay", &self.basic_pay),
            ("claims", &self.claims),
            ("allowance", &self.allowance),
            ("commission", &self.commission),
        ]
    }

    /// Sum of all components
    pub fn total(&self) -> Result<Money, MoneyError> {
        Money::sum(self.components().iter().map(|(_, m)| *m), self.basic_pay.currency())
    }
}

/// Payroll to write for one candidate on one project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollUpdate {
    pub project_id: ProjectId,
    pub candidate_id: CandidateId,
    /// Existing project staff entry, when known
    pub staff_entry_id: Option<PayrollEntryId>,
    pub working_days: Vec<WorkingDay>,
    pub currency: Currency,
}

impl PayrollUpdate {
    pub fn new(project_id: ProjectId, candidate_id: CandidateId, currency: Currency) -> Self {
        Self {
            project_id,
            candidate_id,
            staff_entry_id: None,
            working_days: Vec::new(),
            currency,
        }
    }

    pub fn for_entry(mut self, entry_id: PayrollEntryId) -> Self {
        self.staff_entry_id = Some(entry_id);
        self
    }

    pub fn with_day(mut self, day: WorkingDay) -> Self {
        self.working_days.push(day);
        self
    }

    /// Checks the update before any store is touched
    pub fn validate(&self) -> Result<(), PayrollError> {
        if self.working_days.is_empty() {
            return Err(PayrollError::validation("at least one working day is required"));
        }

        let mut seen = HashSet::new();
        for day in &self.working_days {
            if !seen.insert(day.date) {
                return Err(PayrollError::validation(format!(
                    "working day {} is listed more than once",
                    day.date
                )));
            }
            for (name, amount) in day.components() {
                if amount.currency() != self.currency {
                    return Err(PayrollError::validation(format!(
                        "{} on {} is in {}, expected {}",
                        name,
                        day.date,
                        amount.currency(),
                        self.currency
                    )));
                }
                if amount.is_negative() {
                    return Err(PayrollError::validation(format!(
                        "{} on {} cannot be negative",
                        name, day.date
                    )));
                }
            }
        }
        Ok(())
    }

    /// Total across all working days
    pub fn total(&self) -> Result<Money, MoneyError> {
        let mut total = Money::zero(self.currency);
        for day in &self.working_days {
            total = total.checked_add(&day.total()?)?;
        }
        Ok(total)
    }

    /// Working days ordered by date
    pub fn sorted_days(&self) -> Vec<WorkingDay> {
        let mut days = self.working_days.clone();
        days.sort_by_key(|d| d.date);
        days
    }
}

/// Where a payroll record ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayrollTarget {
    /// The project staff table
    ProjectStaff,
    /// The fallback payroll column on the candidate record
    Candidate,
}

/// A stored payroll record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollRecord {
    /// Staff entry ID; absent when stored on the candidate record
    pub entry_id: Option<PayrollEntryId>,
    pub project_id: ProjectId,
    pub candidate_id: CandidateId,
    pub target: PayrollTarget,
    pub working_days: Vec<WorkingDay>,
    pub total: Money,
    pub updated_at: DateTime<Utc>,
}

impl PayrollRecord {
    /// Builds the record a store would hold after writing `update`
    pub fn from_update(
        update: &PayrollUpdate,
        entry_id: Option<PayrollEntryId>,
        target: PayrollTarget,
    ) -> Result<Self, MoneyError> {
        Ok(Self {
            entry_id,
            project_id: update.project_id,
            candidate_id: update.candidate_id,
            target,
            working_days: update.sorted_days(),
            total: update.total()?,
            updated_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn myr(amount: rust_decimal::Decimal) -> Money {
        Money::new(amount, Currency::MYR)
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 8, d).unwrap()
    }

    #[test]
    fn test_working_day_total() {
        let wd = WorkingDay::basic(day(1), myr(dec!(150)))
            .with_claims(myr(dec!(22.50)))
            .with_allowance(myr(dec!(30)))
            .with_commission(myr(dec!(10)));
        assert_eq!(wd.total().unwrap().amount(), dec!(212.50));
    }

    #[test]
    fn test_update_total() {
        let update = PayrollUpdate::new(ProjectId::new(), CandidateId::new(), Currency::MYR)
            .with_day(WorkingDay::basic(day(2), myr(dec!(100))))
            .with_day(WorkingDay::basic(day(1), myr(dec!(120))).with_allowance(myr(dec!(5))));
        assert_eq!(update.total().unwrap().amount(), dec!(225));
        assert_eq!(update.sorted_days()[0].date, day(1));
    }

    #[test]
    fn test_validation() {
        let base = PayrollUpdate::new(ProjectId::new(), CandidateId::new(), Currency::MYR);
        assert!(base.validate().is_err());

        let duplicate = base
            .clone()
            .with_day(WorkingDay::basic(day(1), myr(dec!(100))))
            .with_day(WorkingDay::basic(day(1), myr(dec!(100))));
        assert!(duplicate.validate().is_err());

        let negative = base
            .clone()
            .with_day(WorkingDay::basic(day(1), myr(dec!(100))).with_allowance(myr(dec!(-1))));
        assert!(negative.validate().is_err());

        let foreign = base
            .clone()
            .with_day(WorkingDay::basic(day(1), Money::new(dec!(100), Currency::SGD)));
        assert!(foreign.validate().is_err());

        let ok = base.with_day(WorkingDay::basic(day(1), myr(dec!(100))));
        assert!(ok.validate().is_ok());
    }
}
