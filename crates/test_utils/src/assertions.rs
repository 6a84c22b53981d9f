//! Custom Test Assertions
//!
//! Provides assertion helpers for decimals and charge breakdowns that give
//! more meaningful failure messages than plain `assert_eq!`.

use domain_billing::ChargeBreakdown;
use rust_decimal::Decimal;

/// Asserts that two decimals are numerically equal, ignoring scale
///
/// # Panics
///
/// Panics with both values if they differ
pub fn assert_decimal_eq(actual: Decimal, expected: Decimal) {
    assert!(
        actual == expected,
        "Decimal mismatch: actual={}, expected={}",
        actual,
        expected
    );
}

/// Asserts that a decimal carries no more than `places` significant fractional digits
pub fn assert_max_places(value: Decimal, places: u32) {
    assert!(
        value.normalize().scale() <= places,
        "{} has more than {} decimal places",
        value,
        places
    );
}

/// Asserts the internal consistency of a charge breakdown
///
/// Amounts and the effective rate are at most 2 places, the percentage at
/// most 5, and the discount amount is within a cent of the rounded final
/// minus the rounded original.
pub fn assert_breakdown_consistent(breakdown: &ChargeBreakdown) {
    assert_max_places(breakdown.original_amount, 2);
    assert_max_places(breakdown.final_amount, 2);
    assert_max_places(breakdown.discount_amount, 2);
    assert_max_places(breakdown.effective_rate, 2);
    assert_max_places(breakdown.discount_percentage, 5);
    let rounded_difference = breakdown.final_amount - breakdown.original_amount;
    assert!(
        (breakdown.discount_amount - rounded_difference).abs() <= Decimal::new(1, 2),
        "Discount {} drifts from {} by more than a cent",
        breakdown.discount_amount,
        rounded_difference
    );
    if breakdown.hours.is_zero() {
        assert_decimal_eq(breakdown.effective_rate, Decimal::ZERO);
    }
    if breakdown.original_amount.is_zero() {
        assert_decimal_eq(breakdown.discount_percentage, Decimal::ZERO);
    }
}
