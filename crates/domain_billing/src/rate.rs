//! Hourly rate and currency resolution
//!
//! The rate for a unit of work comes from the first level of this chain that
//! yields a value. Levels are never blended.
//!
//! 1. Fixed rate on the work code, when flagged as overriding
//! 2. The case's price list, then the system default price list
//! 3. A person-specific override rate
//! 4. The person's default rate
//!
//! Only price lists carry a currency. For every other level the currency is
//! resolved separately from the system default or the case's billing
//! account, falling back to the configured currency.

use std::cmp::Reverse;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use core_kernel::{ActorId, CurrencyCode, LoginId, RoleTypeId, WorkCodeId};

use crate::config::BillingConfig;
use crate::error::{BillingError, BillingResult};
use crate::model::{Case, PersonRate, PriceListEntry};
use crate::ports::BillingReferencePort;

/// Fallback level that produced a rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateLevel {
    WorkCodeFixed,
    CasePriceList,
    DefaultPriceList,
    PersonOverride,
    PersonDefault,
}

/// A resolved hourly rate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateQuote {
    pub hourly_rate: Decimal,
    pub currency: CurrencyCode,
    pub level: RateLevel,
}

/// A rate found by the fallback chain, before currency resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateCandidate {
    pub hourly_rate: Decimal,
    /// Currency supplied by the rate source itself
    pub currency: Option<CurrencyCode>,
    pub level: RateLevel,
}

impl RateCandidate {
    fn without_currency(hourly_rate: Decimal, level: RateLevel) -> Self {
        Self {
            hourly_rate,
            currency: None,
            level,
        }
    }
}

/// Walks the rate fallback chain against a reference-data port
pub struct RateResolver<'a, P: BillingReferencePort + ?Sized> {
    port: &'a P,
    config: &'a BillingConfig,
}

impl<'a, P: BillingReferencePort + ?Sized> RateResolver<'a, P> {
    pub fn new(port: &'a P, config: &'a BillingConfig) -> Self {
        Self { port, config }
    }

    /// Resolves the hourly rate and its currency
    ///
    /// # Errors
    ///
    /// `RateNotFound` if no level yields a rate, `CurrencyNotFound` or
    /// `SystemCurrencyNotFound` if no currency can be determined.
    pub fn resolve(
        &self,
        case: &Case,
        work_code: &WorkCodeId,
        login: &LoginId,
        as_of: NaiveDate,
    ) -> BillingResult<RateQuote> {
        let candidate = self.find_rate(case, work_code, login, as_of)?;
        let currency = match candidate.currency {
            Some(currency) => currency,
            None => self.resolve_currency(case)?,
        };
        debug!(
            case = %case.case_number,
            level = ?candidate.level,
            rate = %candidate.hourly_rate,
            %currency,
            "Resolved hourly rate"
        );
        Ok(RateQuote {
            hourly_rate: candidate.hourly_rate,
            currency,
            level: candidate.level,
        })
    }

    /// Runs the fallback chain, stopping at the first level with a rate
    pub fn find_rate(
        &self,
        case: &Case,
        work_code: &WorkCodeId,
        login: &LoginId,
        as_of: NaiveDate,
    ) -> BillingResult<RateCandidate> {
        if let Some(rate) = self
            .port
            .find_work_code(work_code)?
            .and_then(|code| code.fixed_rate())
        {
            return Ok(RateCandidate::without_currency(rate, RateLevel::WorkCodeFixed));
        }
        debug!(%work_code, "No fixed work code rate");

        if let Some(candidate) = self.find_price_list_rate(case, work_code, login, as_of)? {
            return Ok(candidate);
        }
        debug!(case = %case.case_number, "No applicable price list entry");

        let person_rates = self.port.find_person_rates(login)?;
        if let Some(rate) = select_person_rate(&person_rates, work_code, self.config.role_type_id) {
            return Ok(RateCandidate::without_currency(rate.hourly_rate, RateLevel::PersonOverride));
        }
        debug!(%login, "No person override rate");

        if let Some(rate) = self
            .port
            .find_person(login)?
            .and_then(|person| person.hourly_rate)
        {
            return Ok(RateCandidate::without_currency(rate, RateLevel::PersonDefault));
        }

        warn!(%login, %work_code, case = %case.case_number, "No hourly rate found");
        Err(BillingError::RateNotFound {
            login: login.clone(),
            work_code: work_code.clone(),
        })
    }

    fn find_price_list_rate(
        &self,
        case: &Case,
        work_code: &WorkCodeId,
        login: &LoginId,
        as_of: NaiveDate,
    ) -> BillingResult<Option<RateCandidate>> {
        let actor = self.port.find_case_actor(case.id, self.config.role_type_id)?;

        let case_entries = self.port.find_case_price_list(case.id, work_code)?;
        if let Some(entry) = select_price_list_entry(&case_entries, login, actor, as_of) {
            return Ok(Some(price_list_candidate(entry, RateLevel::CasePriceList)));
        }

        let default_entries = self.port.find_default_price_list(work_code)?;
        Ok(select_price_list_entry(&default_entries, login, actor, as_of)
            .map(|entry| price_list_candidate(entry, RateLevel::DefaultPriceList)))
    }

    /// Resolves the posting currency for a case when the rate source has none
    pub fn resolve_currency(&self, case: &Case) -> BillingResult<CurrencyCode> {
        let fallback = self.config.fallback_currency.clone();
        if self.config.use_system_default_currency {
            return self
                .port
                .system_default_currency()?
                .or(fallback)
                .ok_or_else(|| {
                    warn!(case = %case.case_number, "No system default currency");
                    BillingError::SystemCurrencyNotFound {
                        case_number: case.case_number.clone(),
                    }
                });
        }

        self.port
            .find_case_currency(case.id, self.config.role_type_id)?
            .or(fallback)
            .ok_or_else(|| {
                warn!(case = %case.case_number, "No currency for case");
                BillingError::CurrencyNotFound {
                    case_number: case.case_number.clone(),
                }
            })
    }
}

fn price_list_candidate(entry: &PriceListEntry, level: RateLevel) -> RateCandidate {
    RateCandidate {
        hourly_rate: entry.hourly_rate,
        currency: Some(entry.currency.clone()),
        level,
    }
}

/// Picks the price-list row that applies to a login and the case's actor
///
/// Rows for another login, another actor or a future price change are
/// ignored. The rest rank by category specificity, then exact login over the
/// wildcard login, then exact actor over the default actor, then the most
/// recent price change. Among equally ranked rows the first listed wins.
pub fn select_price_list_entry<'e>(
    entries: &'e [PriceListEntry],
    login: &LoginId,
    case_actor: Option<ActorId>,
    as_of: NaiveDate,
) -> Option<&'e PriceListEntry> {
    entries
        .iter()
        .filter(|entry| entry.effective_date <= as_of)
        .filter(|entry| entry.login_id.as_ref().map_or(true, |l| l.matches(login)))
        .filter(|entry| entry.actor_id.map_or(true, |a| Some(a) == case_actor))
        .min_by(|a, b| price_list_rank(a).cmp(&price_list_rank(b)))
}

fn price_list_rank(entry: &PriceListEntry) -> (Reverse<u8>, bool, bool, Reverse<NaiveDate>) {
    (
        Reverse(entry.category_level),
        entry.login_id.is_none(),
        entry.actor_id.is_none(),
        Reverse(entry.effective_date),
    )
}

/// Picks the most specific person override for a work code and role type
///
/// Overrides naming another work code or role type do not apply. Among the
/// rest, setting both criteria beats setting the work code alone, which
/// beats setting the role type alone, which beats setting neither. Among
/// equally specific overrides the first listed wins.
pub fn select_person_rate<'r>(
    rates: &'r [PersonRate],
    work_code: &WorkCodeId,
    role_type: RoleTypeId,
) -> Option<&'r PersonRate> {
    rates
        .iter()
        .filter(|rate| rate.work_code_id.as_ref().map_or(true, |code| code == work_code))
        .filter(|rate| rate.role_type_id.map_or(true, |role| role == role_type))
        .min_by_key(|rate| Reverse(person_rate_rank(rate)))
}

fn person_rate_rank(rate: &PersonRate) -> (bool, bool) {
    (rate.work_code_id.is_some(), rate.role_type_id.is_some())
}
