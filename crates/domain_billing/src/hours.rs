//! Worked hours
//!
//! Time registrations are recorded in seconds. Postings carry hours rounded
//! half-up to two places.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::round_amount;

const SECONDS_PER_HOUR: u64 = 3600;

/// Actual and chargeable hours of one unit of work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WorkedHours {
    /// Time actually spent
    pub actual: Decimal,
    /// Time billed to the client
    pub chargeable: Decimal,
}

impl WorkedHours {
    pub fn new(actual: Decimal, chargeable: Decimal) -> Self {
        Self { actual, chargeable }
    }

    /// Hours where the whole duration is chargeable
    pub fn billable(hours: Decimal) -> Self {
        Self::new(hours, hours)
    }

    /// Converts actual and chargeable durations in seconds
    pub fn from_seconds(actual_secs: u64, chargeable_secs: u64) -> Self {
        Self::new(Self::to_hours(actual_secs), Self::to_hours(chargeable_secs))
    }

    /// Converts seconds to hours at two decimal places
    pub fn to_hours(secs: u64) -> Decimal {
        round_amount(Decimal::from(secs) / Decimal::from(SECONDS_PER_HOUR))
    }

    /// Chargeable hours after weighting by the worker's experience percentage
    ///
    /// The weighted duration is truncated to whole seconds first.
    pub fn weighted(secs: u64, experience_percent: u32) -> Decimal {
        let weighted_secs = u128::from(secs) * u128::from(experience_percent) / 100;
        let weighted_secs = u64::try_from(weighted_secs).unwrap_or(u64::MAX);
        Self::to_hours(weighted_secs)
    }

    /// Same actual hours with nothing chargeable
    pub fn without_charge(self) -> Self {
        Self::new(self.actual, Decimal::ZERO)
    }
}
