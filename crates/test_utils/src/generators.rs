//! Property-Based Test Generators
//!
//! Provides proptest strategies for billing inputs. Values are generated
//! from integer minor units so they carry a realistic scale.

use core_kernel::{ApplicationTypeId, CaseTypeId, DiscountId, StateId, WorkCodeId};
use domain_billing::{DiscountKind, DiscountRule};
use proptest::prelude::*;
use rust_decimal::Decimal;

/// Hours worked, 0.00 to 24.00
pub fn hours_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..=2400i64).prop_map(|minor| Decimal::new(minor, 2))
}

/// Strictly positive hours
pub fn positive_hours_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..=2400i64).prop_map(|minor| Decimal::new(minor, 2))
}

/// Hourly rates, 0.00 to 2000.00
pub fn rate_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..=200_000i64).prop_map(|minor| Decimal::new(minor, 2))
}

/// Amount thresholds, 0 to 10000 in whole units
pub fn threshold_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..=10_000i64).prop_map(Decimal::from)
}

/// Discount fractions 0.00 to 1.00 applied as `@ * fraction`
pub fn fraction_formula_strategy() -> impl Strategy<Value = String> {
    (0i64..=100i64).prop_map(|pct| format!("@ * {}", Decimal::new(pct, 2)))
}

pub fn discount_kind_strategy() -> impl Strategy<Value = DiscountKind> {
    prop_oneof![Just(DiscountKind::Pure), Just(DiscountKind::Markup)]
}

/// Seconds worked, up to a full day
pub fn seconds_strategy() -> impl Strategy<Value = u64> {
    0u64..=86_400u64
}

/// Discount rules with random criteria, thresholds and fractions
pub fn discount_rule_strategy() -> impl Strategy<Value = DiscountRule> {
    (
        1i32..1000,
        discount_kind_strategy(),
        threshold_strategy(),
        fraction_formula_strategy(),
        any::<[bool; 5]>(),
    )
        .prop_map(|(id, kind, threshold, formula, pins)| {
            let mut rule = DiscountRule::new(DiscountId::new(id), kind.code(), threshold, formula);
            if pins[0] {
                rule = rule.with_case_type(CaseTypeId::new(10));
            }
            if pins[1] {
                rule = rule.with_state(StateId::new("OPEN"));
            }
            if pins[2] {
                rule = rule.with_application_type(ApplicationTypeId::new(20));
            }
            if pins[3] {
                rule = rule.with_work_code(WorkCodeId::new("FEE"));
            }
            if pins[4] {
                rule = rule.with_work_code_type("T");
            }
            rule
        })
}
