//! Currency codes and decimal rounding for ledger values
//!
//! Every monetary value handed to the ledger is rounded with the same
//! half-up strategy so that two postings of the same work always produce
//! identical rows. Amounts and rates carry two decimal places, discount
//! percentages five.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Decimal places for amounts and hourly rates
pub const AMOUNT_SCALE: u32 = 2;

/// Decimal places for discount percentages
pub const PERCENTAGE_SCALE: u32 = 5;

/// Errors that can occur when handling currency values
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Invalid currency code: '{0}'")]
    InvalidCurrency(String),
}

/// Currency code as registered in the case-management system
///
/// Codes are not restricted to a fixed ISO list because the external system
/// lets administrators register their own; they are normalized to upper case
/// and must be 1 to 10 alphanumeric characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Parses and normalizes a currency code
    pub fn new(code: impl AsRef<str>) -> Result<Self, MoneyError> {
        let trimmed = code.as_ref().trim();
        let valid = !trimmed.is_empty()
            && trimmed.len() <= 10
            && trimmed.chars().all(|c| c.is_ascii_alphanumeric());
        if !valid {
            return Err(MoneyError::InvalidCurrency(code.as_ref().to_string()));
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    /// Returns the code
    pub fn code(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CurrencyCode {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = MoneyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> String {
        code.0
    }
}

/// Rounds half away from zero, i.e. commercial rounding
///
/// `0.005` becomes `0.01` and `-0.005` becomes `-0.01`.
pub fn round_half_up(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// Rounds an amount or hourly rate to ledger scale
pub fn round_amount(value: Decimal) -> Decimal {
    round_half_up(value, AMOUNT_SCALE)
}

/// Rounds a percentage to ledger scale
pub fn round_percentage(value: Decimal) -> Decimal {
    round_half_up(value, PERCENTAGE_SCALE)
}
