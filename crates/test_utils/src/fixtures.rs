//! Pre-built Test Fixtures
//!
//! Provides ready-to-use test data for crew members, approvers, amounts,
//! and dates. These fixtures are consistent and predictable for unit tests.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use core_kernel::{CandidateId, ClaimId, Currency, Money, PayrollEntryId, ProjectId, UserId};
use domain_expenses::{ActingUser, Role};
use once_cell::sync::Lazy;
use rust_decimal_macros::dec;
use uuid::Uuid;

static CREW_MEMBER: Lazy<UserId> = Lazy::new(|| {
    UserId::from_uuid(Uuid::from_u128(0x550e8400_e29b_41d4_a716_446655440101))
});
static APPROVER: Lazy<UserId> = Lazy::new(|| {
    UserId::from_uuid(Uuid::from_u128(0x550e8400_e29b_41d4_a716_446655440102))
});
static ADMIN: Lazy<UserId> = Lazy::new(|| {
    UserId::from_uuid(Uuid::from_u128(0x550e8400_e29b_41d4_a716_446655440103))
});

/// Fixture for Money test data
pub struct MoneyFixtures;

impl MoneyFixtures {
    /// A typical meal claim
    pub fn myr_100() -> Money {
        Money::new(dec!(100.00), Currency::MYR)
    }

    /// A travel claim that needs grouping in the display format
    pub fn myr_travel() -> Money {
        Money::new(dec!(1234.50), Currency::MYR)
    }

    pub fn myr_zero() -> Money {
        Money::zero(Currency::MYR)
    }

    /// Daily basic pay for a crew member
    pub fn myr_day_rate() -> Money {
        Money::new(dec!(250.00), Currency::MYR)
    }

    /// Creates an SGD amount for currency mismatch tests
    pub fn sgd_100() -> Money {
        Money::new(dec!(100.00), Currency::SGD)
    }

    /// Creates a negative amount for validation tests
    pub fn myr_negative() -> Money {
        Money::new(dec!(-50.00), Currency::MYR)
    }
}

/// Fixture for temporal test data
pub struct TemporalFixtures;

impl TemporalFixtures {
    /// Receipt date used across tests (Jan 9, 2024)
    pub fn receipt_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 9).expect("valid date")
    }

    /// First day of the payroll period (Mar 4, 2024)
    pub fn shoot_day_one() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 4).expect("valid date")
    }

    /// Consecutive working days starting at `shoot_day_one`
    pub fn shoot_days(count: u32) -> Vec<NaiveDate> {
        Self::shoot_day_one()
            .iter_days()
            .take(count as usize)
            .collect()
    }

    /// Submission timestamp (Jan 10, 2024 09:00 UTC)
    pub fn submitted_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 10, 9, 0, 0).unwrap()
    }

    /// Decision timestamp one day after submission
    pub fn decided_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 11, 14, 30, 0).unwrap()
    }
}

/// Fixture for identifier test data
pub struct IdFixtures;

impl IdFixtures {
    /// The crew member who owns claims in most tests
    pub fn crew_member() -> UserId {
        *CREW_MEMBER
    }

    /// A user assigned as approver for `crew_member`
    pub fn approver() -> UserId {
        *APPROVER
    }

    pub fn admin() -> UserId {
        *ADMIN
    }

    /// Creates a deterministic claim ID for testing
    pub fn claim_id() -> ClaimId {
        ClaimId::from_uuid(Uuid::from_u128(0x550e8400_e29b_41d4_a716_446655440201))
    }

    pub fn project_id() -> ProjectId {
        ProjectId::from_uuid(Uuid::from_u128(0x550e8400_e29b_41d4_a716_446655440301))
    }

    pub fn candidate_id() -> CandidateId {
        CandidateId::from_uuid(Uuid::from_u128(0x550e8400_e29b_41d4_a716_446655440302))
    }

    pub fn payroll_entry_id() -> PayrollEntryId {
        PayrollEntryId::from_uuid(Uuid::from_u128(0x550e8400_e29b_41d4_a716_446655440303))
    }
}

/// Fixture for authenticated sessions
pub struct SessionFixtures;

impl SessionFixtures {
    /// The claim owner with the staff role
    pub fn crew_member() -> ActingUser {
        ActingUser::new(IdFixtures::crew_member()).with_role(Role::Staff)
    }

    /// An approver; assignment to `crew_member` is granted per test
    pub fn approver() -> ActingUser {
        ActingUser::new(IdFixtures::approver()).with_role(Role::Approver)
    }

    pub fn admin() -> ActingUser {
        ActingUser::new(IdFixtures::admin()).with_role(Role::Admin)
    }

    /// A fresh user with no roles
    pub fn stranger() -> ActingUser {
        ActingUser::new(UserId::new())
    }
}

/// Fixture for string test data
pub struct StringFixtures;

impl StringFixtures {
    pub fn claim_title() -> &'static str {
        "Location scouting, Penang"
    }

    pub fn vendor() -> &'static str {
        "Grab"
    }

    pub fn rejection_reason() -> &'static str {
        "Receipt total does not match the claimed amount"
    }

    pub fn receipt_file_ref() -> &'static str {
        "receipts/2024/01/grab-0001.pdf"
    }
}
