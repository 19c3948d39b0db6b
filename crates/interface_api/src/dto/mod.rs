//! Request and response bodies

pub mod claims;
pub mod payroll;

use core_kernel::Currency;
use crate::error::ApiError;

/// Parses an optional ISO 4217 code, falling back to `default`
pub(crate) fn currency_or(code: Option<&str>, default: Currency) -> Result<Currency, ApiError> {
    match code {
        Some(code) => code
            .trim()
            .to_ascii_uppercase()
            .parse()
            .map_err(|e: core_kernel::MoneyError| ApiError::Validation(e.to_string())),
        None => Ok(default),
    }
}

fn validate_non_negative(amount: &rust_decimal::Decimal) -> Result<(), validator::ValidationError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(validator::ValidationError::new("negative_amount"));
    }
    Ok(())
}
