//! Posting orchestration
//!
//! [`BillingEngine::bill`] runs one unit of work through rate resolution,
//! discount matching and charge computation and returns the ledger rows to
//! write. The engine performs no writes; persisting the drafts, and any
//! transaction around them, belongs to the caller.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use core_kernel::{CaseId, CurrencyCode, LoginId, WorkCodeId};

use crate::charge::{ChargeBreakdown, ChargeComputer};
use crate::config::BillingConfig;
use crate::discount::DiscountMatcher;
use crate::error::{BillingError, BillingResult};
use crate::hours::WorkedHours;
use crate::ports::BillingReferencePort;
use crate::rate::{RateQuote, RateResolver};

/// A unit of work to bill
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingRequest {
    pub case_id: CaseId,
    pub work_code: WorkCodeId,
    pub login: LoginId,
    pub hours: WorkedHours,
    /// Date price lists are evaluated at
    pub as_of: NaiveDate,
    /// Date the work was performed
    pub activity_date: NaiveDate,
    pub comment: Option<String>,
}

impl BillingRequest {
    /// Creates a request for work performed on the billing date
    pub fn new(
        case_id: CaseId,
        work_code: WorkCodeId,
        login: LoginId,
        hours: WorkedHours,
        as_of: NaiveDate,
    ) -> Self {
        Self {
            case_id,
            work_code,
            login,
            hours,
            as_of,
            activity_date: as_of,
            comment: None,
        }
    }

    pub fn with_activity_date(mut self, activity_date: NaiveDate) -> Self {
        self.activity_date = activity_date;
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// Budget line row to be written to the case's ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetLineDraft {
    pub case_id: CaseId,
    pub work_code: WorkCodeId,
    pub login: LoginId,
    pub currency: CurrencyCode,
    pub hourly_rate: Decimal,
    pub actual_hours: Decimal,
    pub chargeable_hours: Decimal,
    pub original_amount: Decimal,
    pub chargeable_amount: Decimal,
    pub discount_amount: Decimal,
    pub discount_percentage: Decimal,
    pub effective_rate: Decimal,
    pub comment: Option<String>,
    pub activity_date: NaiveDate,
}

/// Time registration row recording the work itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRegistrationDraft {
    pub case_id: CaseId,
    pub work_code: WorkCodeId,
    pub login: LoginId,
    pub actual_hours: Decimal,
    pub chargeable_hours: Decimal,
    pub comment: Option<String>,
    pub activity_date: NaiveDate,
}

/// Result of billing one unit of work
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingOutcome {
    pub breakdown: ChargeBreakdown,
    pub rate: RateQuote,
    pub currency: CurrencyCode,
    pub budget_line: BudgetLineDraft,
    pub time_registration: TimeRegistrationDraft,
}

/// Billing engine bound to a reference-data port and configuration
pub struct BillingEngine<P: BillingReferencePort> {
    port: P,
    config: BillingConfig,
    computer: ChargeComputer,
}

impl<P: BillingReferencePort> BillingEngine<P> {
    pub fn new(port: P, config: BillingConfig) -> Self {
        Self {
            port,
            config,
            computer: ChargeComputer::new(),
        }
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn config(&self) -> &BillingConfig {
        &self.config
    }

    /// Bills one unit of work
    ///
    /// # Errors
    ///
    /// `CaseNotFound` for an unknown case, any rate, currency or discount
    /// error from the resolution steps, and `Store` when reading reference
    /// data fails.
    #[instrument(
        skip(self, request),
        fields(case_id = %request.case_id, work_code = %request.work_code, login = %request.login)
    )]
    pub fn bill(&self, request: &BillingRequest) -> BillingResult<BillingOutcome> {
        let case = self.port.find_case(request.case_id)?.ok_or_else(|| {
            warn!(case_id = %request.case_id, "Case not found");
            BillingError::CaseNotFound(request.case_id)
        })?;

        let hours = if self.config.is_zero_charge(&request.work_code) {
            debug!(work_code = %request.work_code, "Zero-charge work code");
            request.hours.without_charge()
        } else {
            request.hours
        };

        let rate = RateResolver::new(&self.port, &self.config).resolve(
            &case,
            &request.work_code,
            &request.login,
            request.as_of,
        )?;

        let discounts = DiscountMatcher::new(&self.port, &self.config)
            .applicable_discounts(&request.work_code, &case)?;

        let breakdown = self
            .computer
            .compute(hours.chargeable, rate.hourly_rate, &discounts)?;

        info!(
            case = %case.case_number,
            hours = %hours.chargeable,
            rate = %rate.hourly_rate,
            currency = %rate.currency,
            amount = %breakdown.final_amount,
            discounted = breakdown.has_discount(),
            "Billed work"
        );

        let budget_line = BudgetLineDraft {
            case_id: case.id,
            work_code: request.work_code.clone(),
            login: request.login.clone(),
            currency: rate.currency.clone(),
            hourly_rate: rate.hourly_rate,
            actual_hours: hours.actual,
            chargeable_hours: hours.chargeable,
            original_amount: breakdown.original_amount,
            chargeable_amount: breakdown.final_amount,
            discount_amount: breakdown.discount_amount,
            discount_percentage: breakdown.discount_percentage,
            effective_rate: breakdown.effective_rate,
            comment: request.comment.clone(),
            activity_date: request.activity_date,
        };

        let time_registration = TimeRegistrationDraft {
            case_id: case.id,
            work_code: request.work_code.clone(),
            login: request.login.clone(),
            actual_hours: hours.actual,
            chargeable_hours: hours.chargeable,
            comment: request.comment.clone(),
            activity_date: request.activity_date,
        };

        Ok(BillingOutcome {
            currency: rate.currency.clone(),
            breakdown,
            rate,
            budget_line,
            time_registration,
        })
    }
}
