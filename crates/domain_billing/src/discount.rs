//! Discount rule matching
//!
//! Candidate rules come from the reference-data port already filtered by the
//! static criteria of the query (actor binding, work code, work-code type).
//! The matcher drops rules whose concrete case criteria disagree with the
//! case and keeps only the rules sharing the highest priority. Several rules
//! may survive; choosing among them by amount threshold is the charge
//! computer's job.

use tracing::{debug, warn};

use core_kernel::WorkCodeId;

use crate::config::BillingConfig;
use crate::error::{BillingError, BillingResult};
use crate::model::{Case, DiscountRule};
use crate::ports::BillingReferencePort;

/// Finds the discount rules applicable to a unit of work on a case
pub struct DiscountMatcher<'a, P: BillingReferencePort + ?Sized> {
    port: &'a P,
    config: &'a BillingConfig,
}

impl<'a, P: BillingReferencePort + ?Sized> DiscountMatcher<'a, P> {
    pub fn new(port: &'a P, config: &'a BillingConfig) -> Self {
        Self { port, config }
    }

    /// Returns the highest-priority rules applicable to the work code and case
    ///
    /// An empty list means no discount applies.
    pub fn applicable_discounts(
        &self,
        work_code: &WorkCodeId,
        case: &Case,
    ) -> BillingResult<Vec<DiscountRule>> {
        let candidates = self
            .port
            .find_discounts(work_code, self.config.role_type_id, case.id)?;
        let applicable = most_specific(candidates, case);
        debug!(
            case = %case.case_number,
            %work_code,
            count = applicable.len(),
            priority = ?applicable.first().map(DiscountRule::priority),
            "Matched discount rules"
        );

        if self.config.strict_discount_priority {
            ensure_distinct_priority(&applicable, case)?;
        }
        Ok(applicable)
    }
}

/// Keeps the rules matching the case that share the maximum priority
pub fn most_specific(rules: Vec<DiscountRule>, case: &Case) -> Vec<DiscountRule> {
    let matching: Vec<DiscountRule> = rules
        .into_iter()
        .filter(|rule| rule.matches_case(case))
        .collect();

    let Some(highest) = matching.iter().map(DiscountRule::priority).max() else {
        return Vec::new();
    };

    matching
        .into_iter()
        .filter(|rule| rule.priority() == highest)
        .collect()
}

/// Rejects a tie among the top-priority rules
///
/// Used when rule selection must not depend on amount thresholds.
pub fn ensure_distinct_priority(rules: &[DiscountRule], case: &Case) -> BillingResult<()> {
    if rules.len() > 1 {
        let priority = rules[0].priority();
        warn!(
            case = %case.case_number,
            priority,
            count = rules.len(),
            "Indistinct discount policy"
        );
        return Err(BillingError::AmbiguousDiscountPolicy {
            case_number: case.case_number.clone(),
            priority,
            count: rules.len(),
        });
    }
    Ok(())
}
