//! Test Data Builders
//!
//! Provides builder patterns for constructing billing reference data with
//! sensible defaults. Tests specify only the fields relevant to the scenario.

use chrono::NaiveDate;
use core_kernel::{
    ActorId, ApplicationTypeId, CaseTypeId, CurrencyCode, DiscountId, LoginId, StateId,
    WorkCodeId,
};
use domain_billing::ports::mock::MockReferenceData;
use domain_billing::{
    Case, DiscountKind, DiscountRule, Person, PersonRate, PriceListEntry, WorkCode,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::fixtures::{CaseFixtures, CurrencyFixtures, DateFixtures, IdFixtures};

/// Builder for discount rules
///
/// Defaults to an unconstrained pure discount of 10% from threshold zero.
pub struct DiscountRuleBuilder {
    rule: DiscountRule,
}

impl Default for DiscountRuleBuilder {
    fn default() -> Self {
        Self::new(1)
    }
}

impl DiscountRuleBuilder {
    pub fn new(id: i32) -> Self {
        Self {
            rule: DiscountRule::new(
                DiscountId::new(id),
                DiscountKind::PURE_CODE,
                dec!(0),
                "@ * 0.1",
            ),
        }
    }

    /// Turns the rule into a markup
    pub fn markup(mut self) -> Self {
        self.rule.discount_type = DiscountKind::MARKUP_CODE;
        self
    }

    /// Sets a raw discount type code, including unknown ones
    pub fn with_type_code(mut self, code: i32) -> Self {
        self.rule.discount_type = code;
        self
    }

    pub fn with_threshold(mut self, threshold: Decimal) -> Self {
        self.rule.amount_threshold = threshold;
        self
    }

    pub fn with_formula(mut self, formula: impl Into<String>) -> Self {
        self.rule.formula = formula.into();
        self
    }

    pub fn for_case_type(mut self, case_type_id: CaseTypeId) -> Self {
        self.rule = self.rule.with_case_type(case_type_id);
        self
    }

    pub fn for_state(mut self, state: &str) -> Self {
        self.rule = self.rule.with_state(StateId::new(state));
        self
    }

    pub fn for_application_type(mut self, application_type_id: ApplicationTypeId) -> Self {
        self.rule = self.rule.with_application_type(application_type_id);
        self
    }

    pub fn for_work_code(mut self, work_code: WorkCodeId) -> Self {
        self.rule = self.rule.with_work_code(work_code);
        self
    }

    pub fn for_work_code_type(mut self, work_code_type: &str) -> Self {
        self.rule = self.rule.with_work_code_type(work_code_type);
        self
    }

    /// Pins every criterion to the standard case and `FEE` work code
    pub fn fully_specific(self) -> Self {
        self.for_case_type(CaseFixtures::CASE_TYPE)
            .for_state(CaseFixtures::STATE)
            .for_application_type(CaseFixtures::APPLICATION_TYPE)
            .for_work_code(IdFixtures::fee_work_code())
            .for_work_code_type("T")
    }

    pub fn build(self) -> DiscountRule {
        self.rule
    }
}

/// Builder for price-list rows
///
/// Defaults to a category 0 wildcard row at 100 EUR effective last year.
pub struct PriceListEntryBuilder {
    entry: PriceListEntry,
}

impl Default for PriceListEntryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PriceListEntryBuilder {
    pub fn new() -> Self {
        Self {
            entry: PriceListEntry {
                category_level: 0,
                actor_id: None,
                login_id: None,
                currency: CurrencyFixtures::eur(),
                hourly_rate: dec!(100),
                effective_date: DateFixtures::last_year(),
            },
        }
    }

    pub fn with_rate(mut self, rate: Decimal) -> Self {
        self.entry.hourly_rate = rate;
        self
    }

    pub fn with_currency(mut self, currency: CurrencyCode) -> Self {
        self.entry.currency = currency;
        self
    }

    pub fn with_category(mut self, level: u8) -> Self {
        self.entry.category_level = level;
        self
    }

    pub fn for_actor(mut self, actor_id: ActorId) -> Self {
        self.entry.actor_id = Some(actor_id);
        self
    }

    pub fn for_login(mut self, login: LoginId) -> Self {
        self.entry.login_id = Some(login);
        self
    }

    pub fn effective(mut self, date: NaiveDate) -> Self {
        self.entry.effective_date = date;
        self
    }

    pub fn build(self) -> PriceListEntry {
        self.entry
    }
}

/// Builder for the in-memory reference-data port
///
/// `new()` registers the standard case with the client actor cast in the
/// client role. Nothing else is registered, so every rate level starts empty.
pub struct ReferenceDataBuilder {
    data: MockReferenceData,
}

impl Default for ReferenceDataBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReferenceDataBuilder {
    pub fn new() -> Self {
        Self::empty()
            .with_case(CaseFixtures::standard())
            .with_casting(IdFixtures::CLIENT)
    }

    /// A store with nothing registered
    pub fn empty() -> Self {
        Self {
            data: MockReferenceData::new(),
        }
    }

    pub fn with_case(mut self, case: Case) -> Self {
        self.data = self.data.with_case(case);
        self
    }

    /// Casts an actor on the standard case in the client role
    pub fn with_casting(mut self, actor_id: ActorId) -> Self {
        self.data = self
            .data
            .with_casting(CaseFixtures::CASE_ID, IdFixtures::CLIENT_ROLE, actor_id);
        self
    }

    pub fn with_work_code(mut self, work_code: WorkCode) -> Self {
        self.data = self.data.with_work_code(work_code);
        self
    }

    /// Registers the `FIX` work code with an overriding rate
    pub fn with_fixed_rate_work_code(self, rate: Decimal) -> Self {
        self.with_work_code(
            WorkCode::new(IdFixtures::fixed_work_code(), "Fixed fee").with_fixed_rate(rate),
        )
    }

    /// Adds a row to the standard case's price list
    pub fn with_case_price(mut self, entry: PriceListEntry) -> Self {
        self.data = self.data.with_case_price_entry(CaseFixtures::CASE_ID, entry);
        self
    }

    pub fn with_default_price(mut self, entry: PriceListEntry) -> Self {
        self.data = self.data.with_default_price_entry(entry);
        self
    }

    pub fn with_person_rate(
        mut self,
        login: LoginId,
        work_code: Option<WorkCodeId>,
        with_role: bool,
        rate: Decimal,
    ) -> Self {
        self.data = self.data.with_person_rate(PersonRate {
            login_id: login,
            role_type_id: with_role.then_some(IdFixtures::CLIENT_ROLE),
            work_code_id: work_code,
            hourly_rate: rate,
        });
        self
    }

    pub fn with_person(mut self, login: LoginId, rate: Option<Decimal>) -> Self {
        self.data = self.data.with_person(Person {
            login_id: login,
            email: None,
            hourly_rate: rate,
        });
        self
    }

    /// Registers a discount negotiated with the client actor
    pub fn with_client_discount(mut self, rule: DiscountRule) -> Self {
        self.data = self.data.with_discount(IdFixtures::CLIENT, rule);
        self
    }

    pub fn with_discount(mut self, actor_id: ActorId, rule: DiscountRule) -> Self {
        self.data = self.data.with_discount(actor_id, rule);
        self
    }

    pub fn with_system_currency(mut self, currency: CurrencyCode) -> Self {
        self.data = self.data.with_system_currency(currency);
        self
    }

    /// Registers the client actor's account currency
    pub fn with_client_currency(mut self, currency: CurrencyCode) -> Self {
        self.data = self.data.with_actor_currency(IdFixtures::CLIENT, currency);
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.data = self.data.unavailable();
        self
    }

    pub fn build(self) -> MockReferenceData {
        self.data
    }
}
