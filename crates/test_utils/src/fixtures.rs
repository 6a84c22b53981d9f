//! Pre-built Test Fixtures
//!
//! Provides ready-to-use reference data for billing tests. Fixtures are
//! consistent and predictable; use `fake` based helpers only where the value
//! must not matter.

use chrono::NaiveDate;
use core_kernel::{
    ActorId, ApplicationTypeId, CaseId, CaseTypeId, CurrencyCode, LoginId, RoleTypeId,
    StateId, WorkCodeId,
};
use domain_billing::{BillingConfig, Case};
use fake::faker::internet::en::Username;
use fake::faker::lorem::en::Word;
use fake::Fake;

/// Fixture for identifiers shared across scenarios
pub struct IdFixtures;

impl IdFixtures {
    /// Role type under which the client is cast on cases
    pub const CLIENT_ROLE: RoleTypeId = RoleTypeId::new(1);

    /// Actor cast as client on the standard case
    pub const CLIENT: ActorId = ActorId::new(100);

    /// An unrelated actor
    pub const OTHER_ACTOR: ActorId = ActorId::new(200);

    pub fn login() -> LoginId {
        LoginId::new("jdoe")
    }

    pub fn other_login() -> LoginId {
        LoginId::new("asmith")
    }

    /// A random login that matches nothing registered
    pub fn random_login() -> LoginId {
        LoginId::new(Username().fake::<String>())
    }

    /// Plain time work code
    pub fn fee_work_code() -> WorkCodeId {
        WorkCodeId::new("FEE")
    }

    /// Work code flagged as never chargeable
    pub fn no_charge_work_code() -> WorkCodeId {
        WorkCodeId::new("NC")
    }

    /// Work code carrying a fixed rate
    pub fn fixed_work_code() -> WorkCodeId {
        WorkCodeId::new("FIX")
    }
}

/// Fixture for cases
pub struct CaseFixtures;

impl CaseFixtures {
    pub const CASE_ID: CaseId = CaseId::new(1);
    pub const CASE_TYPE: CaseTypeId = CaseTypeId::new(10);
    pub const APPLICATION_TYPE: ApplicationTypeId = ApplicationTypeId::new(20);
    pub const STATE: &'static str = "OPEN";

    /// The standard open patent case
    pub fn standard() -> Case {
        Case::new(
            Self::CASE_ID,
            "P-2024-001",
            Self::CASE_TYPE,
            StateId::new(Self::STATE),
            Self::APPLICATION_TYPE,
        )
        .with_catch_word("Widget")
    }

    /// A second case with different attributes
    pub fn other(id: i64) -> Case {
        Case::new(
            CaseId::new(id),
            format!("T-{}", id),
            CaseTypeId::new(11),
            StateId::new("PENDING"),
            ApplicationTypeId::new(21),
        )
    }

    /// A state id that no rule is expected to pin
    pub fn random_state() -> StateId {
        StateId::new(Word().fake::<String>().to_uppercase())
    }
}

/// Fixture for dates
pub struct DateFixtures;

impl DateFixtures {
    /// Billing date used by most scenarios
    pub fn billing_date() -> NaiveDate {
        Self::date(2024, 6, 15)
    }

    pub fn last_year() -> NaiveDate {
        Self::date(2023, 1, 1)
    }

    pub fn next_month() -> NaiveDate {
        Self::date(2024, 7, 15)
    }

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid fixture date")
    }
}

/// Fixture for currencies
pub struct CurrencyFixtures;

impl CurrencyFixtures {
    pub fn eur() -> CurrencyCode {
        Self::code("EUR")
    }

    pub fn usd() -> CurrencyCode {
        Self::code("USD")
    }

    pub fn sek() -> CurrencyCode {
        Self::code("SEK")
    }

    fn code(code: &str) -> CurrencyCode {
        CurrencyCode::new(code).expect("valid fixture currency")
    }
}

/// Fixture for engine configuration
pub struct ConfigFixtures;

impl ConfigFixtures {
    /// Client role with `NC` as the zero-charge work code
    pub fn standard() -> BillingConfig {
        BillingConfig::new(IdFixtures::CLIENT_ROLE)
            .with_zero_charge_work_code(IdFixtures::no_charge_work_code())
    }
}
