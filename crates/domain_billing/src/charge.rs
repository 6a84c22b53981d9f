//! Charge computation
//!
//! Turns chargeable hours, an hourly rate and the top-priority discount
//! candidates into the figures posted to the ledger. At most one rule is
//! applied: the one with the largest amount threshold the undiscounted charge
//! reaches.
//!
//! All outputs are rounded half-up, amounts and rates to 2 places and the
//! discount percentage to 5. Intermediate values are kept exact.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use core_kernel::{round_amount, round_percentage, DiscountId};

use crate::error::{BillingError, BillingResult};
use crate::formula::Formula;
use crate::model::{DiscountKind, DiscountRule};

/// The discount rule applied to a charge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedDiscount {
    pub discount_id: DiscountId,
    pub kind: DiscountKind,
    pub amount_threshold: Decimal,
    /// Formula result before it was subtracted or added
    pub adjustment: Decimal,
}

/// Ledger figures for one unit of work
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeBreakdown {
    pub hours: Decimal,
    /// Hours times rate, before any discount
    pub original_amount: Decimal,
    /// Amount to charge
    pub final_amount: Decimal,
    /// Unrounded final minus original amount, then rounded; negative for discounts
    pub discount_amount: Decimal,
    /// Discount relative to the original amount, in percent
    pub discount_percentage: Decimal,
    /// Realized hourly rate, `final_amount / hours`
    pub effective_rate: Decimal,
    /// `None` when no rule applied, as opposed to a rule worth zero
    pub applied_discount: Option<AppliedDiscount>,
}

impl ChargeBreakdown {
    /// Returns true if a discount or markup rule was applied
    pub fn has_discount(&self) -> bool {
        self.applied_discount.is_some()
    }
}

/// Computes charge breakdowns
#[derive(Debug, Clone, Copy, Default)]
pub struct ChargeComputer;

impl ChargeComputer {
    pub fn new() -> Self {
        Self
    }

    /// Computes the charge for `hours` at `hourly_rate`, applying at most one
    /// of `candidates`
    ///
    /// # Errors
    ///
    /// `UnknownDiscountKind` or `Formula` if the selected rule is
    /// misconfigured; `InvalidPosting` for negative inputs or overflow.
    pub fn compute(
        &self,
        hours: Decimal,
        hourly_rate: Decimal,
        candidates: &[DiscountRule],
    ) -> BillingResult<ChargeBreakdown> {
        if hours.is_sign_negative() && !hours.is_zero() {
            return Err(BillingError::InvalidPosting(format!("negative hours {}", hours)));
        }
        if hourly_rate.is_sign_negative() && !hourly_rate.is_zero() {
            return Err(BillingError::InvalidPosting(format!(
                "negative hourly rate {}",
                hourly_rate
            )));
        }

        let original = hours.checked_mul(hourly_rate).ok_or_else(|| {
            BillingError::InvalidPosting(format!("{} h x {} overflows", hours, hourly_rate))
        })?;

        let applied = match select_discount(original, candidates) {
            Some(rule) => Some(apply(rule, original)?),
            None => None,
        };

        let final_amount = match &applied {
            Some((_, final_amount)) => *final_amount,
            None => original,
        };
        let difference = final_amount - original;

        let discount_percentage = if original.is_zero() {
            Decimal::ZERO
        } else {
            let percentage = difference
                .checked_div(original)
                .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
                .ok_or_else(|| {
                    BillingError::InvalidPosting(format!(
                        "discount of {} on {} overflows",
                        difference, original
                    ))
                })?;
            round_percentage(percentage)
        };

        let effective_rate = if hours.is_zero() {
            Decimal::ZERO
        } else if applied.is_none() {
            round_amount(hourly_rate)
        } else {
            let rate = final_amount.checked_div(hours).ok_or_else(|| {
                BillingError::InvalidPosting(format!(
                    "effective rate of {} over {} h overflows",
                    final_amount, hours
                ))
            })?;
            round_amount(rate)
        };

        Ok(ChargeBreakdown {
            hours,
            original_amount: round_amount(original),
            final_amount: round_amount(final_amount),
            discount_amount: round_amount(difference),
            discount_percentage,
            effective_rate,
            applied_discount: applied.map(|(discount, _)| discount),
        })
    }
}

/// Picks the rule with the largest amount threshold not above `original`
///
/// Returns `None` when `original` is below every threshold. Among rules with
/// the same threshold the first listed wins.
pub fn select_discount(
    original: Decimal,
    candidates: &[DiscountRule],
) -> Option<&DiscountRule> {
    let mut by_threshold: Vec<&DiscountRule> = candidates.iter().collect();
    // stable: equal thresholds keep their listed order
    by_threshold.sort_by(|a, b| b.amount_threshold.cmp(&a.amount_threshold));
    by_threshold
        .into_iter()
        .find(|rule| rule.amount_threshold <= original)
}

fn apply(rule: &DiscountRule, original: Decimal) -> BillingResult<(AppliedDiscount, Decimal)> {
    let kind = rule.kind()?;
    let adjustment = Formula::parse(&rule.formula)?.evaluate(original)?;
    let final_amount = match kind {
        DiscountKind::Pure => original.checked_sub(adjustment),
        DiscountKind::Markup => original.checked_add(adjustment),
    }
    .ok_or_else(|| BillingError::formula(&rule.formula, "arithmetic overflow"))?;

    debug!(
        discount_id = %rule.id,
        ?kind,
        threshold = %rule.amount_threshold,
        %adjustment,
        "Applied discount rule"
    );

    Ok((
        AppliedDiscount {
            discount_id: rule.id,
            kind,
            amount_threshold: rule.amount_threshold,
            adjustment,
        },
        final_amount,
    ))
}
