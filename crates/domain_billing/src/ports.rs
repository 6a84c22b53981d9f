//! Billing Domain Ports
//!
//! The engine reads every piece of reference data through
//! [`BillingReferencePort`]. Implementations must return consistent
//! point-in-time reads within one billing computation; the engine itself
//! never caches, retries or writes.
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_billing::{BillingEngine, BillingConfig};
//!
//! let port = SqlReferenceData::new(pool);
//! let engine = BillingEngine::new(port, BillingConfig::from_env()?);
//! let outcome = engine.bill(&request)?;
//! ```

use core_kernel::{
    ActorId, CaseId, CurrencyCode, DomainPort, LoginId, PortError, RoleTypeId, WorkCodeId,
};

use crate::model::{Case, DiscountRule, Person, PersonRate, PriceListEntry, WorkCode};

/// Read access to the case-management system's billing reference data
pub trait BillingReferencePort: DomainPort {
    /// Loads a case by id
    fn find_case(&self, case_id: CaseId) -> Result<Option<Case>, PortError>;

    /// Loads a work code by id
    fn find_work_code(&self, work_code_id: &WorkCodeId) -> Result<Option<WorkCode>, PortError>;

    /// Returns the primary actor cast on the case in the given role
    fn find_case_actor(
        &self,
        case_id: CaseId,
        role_type_id: RoleTypeId,
    ) -> Result<Option<ActorId>, PortError>;

    /// Returns the candidate rows of the price list attached to the case
    fn find_case_price_list(
        &self,
        case_id: CaseId,
        work_code_id: &WorkCodeId,
    ) -> Result<Vec<PriceListEntry>, PortError>;

    /// Returns the candidate rows of the system default price list
    fn find_default_price_list(
        &self,
        work_code_id: &WorkCodeId,
    ) -> Result<Vec<PriceListEntry>, PortError>;

    /// Returns every person-specific rate override for the login
    fn find_person_rates(&self, login_id: &LoginId) -> Result<Vec<PersonRate>, PortError>;

    /// Loads a person by login
    fn find_person(&self, login_id: &LoginId) -> Result<Option<Person>, PortError>;

    /// Returns the discount rules statically eligible for the work code and the
    /// case's actor in the given role: work-code type unset or time type, work
    /// code unset or equal
    fn find_discounts(
        &self,
        work_code_id: &WorkCodeId,
        role_type_id: RoleTypeId,
        case_id: CaseId,
    ) -> Result<Vec<DiscountRule>, PortError>;

    /// Returns the system default currency, if one is registered
    fn system_default_currency(&self) -> Result<Option<CurrencyCode>, PortError>;

    /// Returns the billing-account currency of the case's actor in the given role
    fn find_case_currency(
        &self,
        case_id: CaseId,
        role_type_id: RoleTypeId,
    ) -> Result<Option<CurrencyCode>, PortError>;
}

/// In-memory implementation of BillingReferencePort for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::model::TIME_WORK_CODE_TYPE;

    /// Discount rule bound to the actor it was negotiated with
    #[derive(Debug, Clone)]
    struct BoundDiscount {
        actor_id: ActorId,
        rule: DiscountRule,
    }

    /// In-memory reference data
    ///
    /// Counts price-list reads so tests can assert which fallback levels
    /// were consulted.
    #[derive(Debug, Default)]
    pub struct MockReferenceData {
        cases: HashMap<CaseId, Case>,
        work_codes: HashMap<WorkCodeId, WorkCode>,
        castings: HashMap<(CaseId, RoleTypeId), ActorId>,
        case_price_lists: HashMap<CaseId, Vec<PriceListEntry>>,
        default_price_list: Vec<PriceListEntry>,
        person_rates: Vec<PersonRate>,
        persons: Vec<Person>,
        discounts: Vec<BoundDiscount>,
        system_currency: Option<CurrencyCode>,
        actor_currencies: HashMap<ActorId, CurrencyCode>,
        price_list_reads: AtomicUsize,
        unavailable: bool,
    }

    impl MockReferenceData {
        /// Creates an empty store
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_case(mut self, case: Case) -> Self {
            self.cases.insert(case.id, case);
            self
        }

        pub fn with_work_code(mut self, work_code: WorkCode) -> Self {
            self.work_codes.insert(work_code.id.clone(), work_code);
            self
        }

        /// Casts an actor on a case in a role
        pub fn with_casting(
            mut self,
            case_id: CaseId,
            role_type_id: RoleTypeId,
            actor_id: ActorId,
        ) -> Self {
            self.castings.insert((case_id, role_type_id), actor_id);
            self
        }

        pub fn with_case_price_entry(mut self, case_id: CaseId, entry: PriceListEntry) -> Self {
            self.case_price_lists.entry(case_id).or_default().push(entry);
            self
        }

        pub fn with_default_price_entry(mut self, entry: PriceListEntry) -> Self {
            self.default_price_list.push(entry);
            self
        }

        pub fn with_person_rate(mut self, rate: PersonRate) -> Self {
            self.person_rates.push(rate);
            self
        }

        pub fn with_person(mut self, person: Person) -> Self {
            self.persons.push(person);
            self
        }

        /// Registers a discount rule negotiated with an actor
        pub fn with_discount(mut self, actor_id: ActorId, rule: DiscountRule) -> Self {
            self.discounts.push(BoundDiscount { actor_id, rule });
            self
        }

        pub fn with_system_currency(mut self, currency: CurrencyCode) -> Self {
            self.system_currency = Some(currency);
            self
        }

        /// Registers the billing-account currency of an actor
        pub fn with_actor_currency(mut self, actor_id: ActorId, currency: CurrencyCode) -> Self {
            self.actor_currencies.insert(actor_id, currency);
            self
        }

        /// Makes every read fail with a transient connection error
        pub fn unavailable(mut self) -> Self {
            self.unavailable = true;
            self
        }

        /// Number of price-list reads served so far
        pub fn price_list_reads(&self) -> usize {
            self.price_list_reads.load(Ordering::SeqCst)
        }

        fn check_available(&self) -> Result<(), PortError> {
            if self.unavailable {
                return Err(PortError::connection("mock reference data is unavailable"));
            }
            Ok(())
        }
    }

    impl DomainPort for MockReferenceData {}

    impl BillingReferencePort for MockReferenceData {
        fn find_case(&self, case_id: CaseId) -> Result<Option<Case>, PortError> {
            self.check_available()?;
            Ok(self.cases.get(&case_id).cloned())
        }

        fn find_work_code(&self, work_code_id: &WorkCodeId) -> Result<Option<WorkCode>, PortError> {
            self.check_available()?;
            Ok(self.work_codes.get(work_code_id).cloned())
        }

        fn find_case_actor(
            &self,
            case_id: CaseId,
            role_type_id: RoleTypeId,
        ) -> Result<Option<ActorId>, PortError> {
            self.check_available()?;
            Ok(self.castings.get(&(case_id, role_type_id)).copied())
        }

        fn find_case_price_list(
            &self,
            case_id: CaseId,
            _work_code_id: &WorkCodeId,
        ) -> Result<Vec<PriceListEntry>, PortError> {
            self.check_available()?;
            self.price_list_reads.fetch_add(1, Ordering::SeqCst);
            Ok(self.case_price_lists.get(&case_id).cloned().unwrap_or_default())
        }

        fn find_default_price_list(
            &self,
            _work_code_id: &WorkCodeId,
        ) -> Result<Vec<PriceListEntry>, PortError> {
            self.check_available()?;
            self.price_list_reads.fetch_add(1, Ordering::SeqCst);
            Ok(self.default_price_list.clone())
        }

        fn find_person_rates(&self, login_id: &LoginId) -> Result<Vec<PersonRate>, PortError> {
            self.check_available()?;
            Ok(self
                .person_rates
                .iter()
                .filter(|rate| rate.login_id.matches(login_id))
                .cloned()
                .collect())
        }

        fn find_person(&self, login_id: &LoginId) -> Result<Option<Person>, PortError> {
            self.check_available()?;
            Ok(self
                .persons
                .iter()
                .find(|person| person.login_id.matches(login_id))
                .cloned())
        }

        fn find_discounts(
            &self,
            work_code_id: &WorkCodeId,
            role_type_id: RoleTypeId,
            case_id: CaseId,
        ) -> Result<Vec<DiscountRule>, PortError> {
            self.check_available()?;
            let Some(actor_id) = self.castings.get(&(case_id, role_type_id)) else {
                return Ok(Vec::new());
            };
            Ok(self
                .discounts
                .iter()
                .filter(|bound| bound.actor_id == *actor_id)
                .map(|bound| &bound.rule)
                .filter(|rule| {
                    rule.work_code_type_criterion()
                        .map_or(true, |kind| kind == TIME_WORK_CODE_TYPE)
                })
                .filter(|rule| rule.work_code_criterion().map_or(true, |code| code == work_code_id))
                .cloned()
                .collect())
        }

        fn system_default_currency(&self) -> Result<Option<CurrencyCode>, PortError> {
            self.check_available()?;
            Ok(self.system_currency.clone())
        }

        fn find_case_currency(
            &self,
            case_id: CaseId,
            role_type_id: RoleTypeId,
        ) -> Result<Option<CurrencyCode>, PortError> {
            self.check_available()?;
            Ok(self
                .castings
                .get(&(case_id, role_type_id))
                .and_then(|actor_id| self.actor_currencies.get(actor_id))
                .cloned())
        }
    }
}
