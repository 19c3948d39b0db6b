//! Property-Based Test Generators
//!
//! Provides proptest strategies for generating random test data that
//! maintains domain invariants, plus `fake`-backed helpers for realistic
//! free text in example-based tests.

use chrono::{Duration, NaiveDate};
use core_kernel::{Currency, Money, UserId};
use domain_expenses::{ClaimDetails, ClaimEvent, NewReceipt};
use domain_payroll::WorkingDay;
use fake::faker::company::en::CompanyName;
use fake::faker::lorem::en::Sentence;
use fake::Fake;
use proptest::prelude::*;
use rust_decimal::Decimal;

/// Strategy for non-negative MYR amounts up to RM 100,000
pub fn myr_money_strategy() -> impl Strategy<Value = Money> {
    (0i64..10_000_000i64).prop_map(|minor| Money::from_minor(minor, Currency::MYR))
}

/// Strategy for small MYR pay components (up to RM 1,000)
pub fn pay_component_strategy() -> impl Strategy<Value = Money> {
    (0i64..100_000i64).prop_map(|minor| Money::from_minor(minor, Currency::MYR))
}

/// Strategy for dates within 2024
pub fn date_2024_strategy() -> impl Strategy<Value = NaiveDate> {
    (0i64..366i64).prop_map(|offset| {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default() + Duration::days(offset)
    })
}

/// Strategy for claim titles, some padded with whitespace
pub fn claim_title_strategy() -> impl Strategy<Value = String> {
    (" {0,2}", "[A-Z][a-z]{2,12}( [a-z]{2,8}){0,3}", " {0,2}")
        .prop_map(|(lead, body, trail)| format!("{}{}{}", lead, body, trail))
}

/// Strategy for valid claim details in MYR
pub fn claim_details_strategy() -> impl Strategy<Value = ClaimDetails> {
    (claim_title_strategy(), myr_money_strategy(), proptest::option::of("[a-z ]{0,40}"))
        .prop_map(|(title, amount, description)| {
            let details = ClaimDetails::new(title, amount);
            match description {
                Some(d) => details.with_description(d),
                None => details,
            }
        })
}

/// Strategy for receipts in MYR
pub fn new_receipt_strategy() -> impl Strategy<Value = NewReceipt> {
    (myr_money_strategy(), date_2024_strategy(), "[A-Z][A-Za-z]{1,15}")
        .prop_map(|(amount, date, vendor)| NewReceipt::new(amount, date, vendor))
}

/// Strategy for lists of receipts, possibly empty
pub fn receipts_strategy(max: usize) -> impl Strategy<Value = Vec<NewReceipt>> {
    proptest::collection::vec(new_receipt_strategy(), 0..=max)
}

/// Strategy for lifecycle events
pub fn claim_event_strategy() -> impl Strategy<Value = ClaimEvent> {
    prop_oneof![
        Just(ClaimEvent::Submit),
        Just(ClaimEvent::Approve),
        Just(ClaimEvent::Reject),
    ]
}

/// Strategy for a working day with every component in MYR
pub fn working_day_strategy() -> impl Strategy<Value = WorkingDay> {
    (
        date_2024_strategy(),
        pay_component_strategy(),
        pay_component_strategy(),
        pay_component_strategy(),
        pay_component_strategy(),
    )
        .prop_map(|(date, basic, claims, allowance, commission)| {
            WorkingDay::basic(date, basic)
                .with_claims(claims)
                .with_allowance(allowance)
                .with_commission(commission)
        })
}

/// Strategy for working days on distinct dates
pub fn distinct_working_days_strategy(max: usize) -> impl Strategy<Value = Vec<WorkingDay>> {
    proptest::collection::vec(working_day_strategy(), 1..=max).prop_map(|mut days| {
        days.sort_by_key(|d| d.date);
        days.dedup_by_key(|d| d.date);
        days
    })
}

/// Strategy for UserId
pub fn user_id_strategy() -> impl Strategy<Value = UserId> {
    any::<u128>().prop_map(|bits| UserId::from_uuid(uuid::Uuid::from_u128(bits)))
}

/// Strategy for positive decimal amounts with two places
pub fn positive_decimal_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000_000i64).prop_map(|m| Decimal::new(m, 2))
}

/// A realistic vendor name
pub fn fake_vendor() -> String {
    CompanyName().fake()
}

/// A short free-text description
pub fn fake_description() -> String {
    Sentence(3..8).fake()
}

/// A realistic claim title
pub fn fake_claim_title() -> String {
    let words: String = Sentence(2..5).fake();
    words.trim_end_matches('.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn myr_money_is_never_negative(money in myr_money_strategy()) {
            prop_assert!(!money.is_negative());
            prop_assert_eq!(money.currency(), Currency::MYR);
        }

        #[test]
        fn generated_details_validate(details in claim_details_strategy()) {
            prop_assert!(details.validated().is_ok());
        }

        #[test]
        fn distinct_days_have_unique_dates(days in distinct_working_days_strategy(10)) {
            prop_assert!(!days.is_empty());
            prop_assert!(days.windows(2).all(|w| w[0].date < w[1].date));
        }

        #[test]
        fn working_day_total_is_non_negative(day in working_day_strategy()) {
            prop_assert!(!day.total().unwrap().is_negative());
        }
    }

    #[test]
    fn fake_text_is_not_blank() {
        assert!(!fake_vendor().trim().is_empty());
        assert!(!fake_description().trim().is_empty());
        assert!(!fake_claim_title().trim().is_empty());
    }
}
