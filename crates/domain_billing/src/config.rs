//! Billing engine configuration
//!
//! Configuration is an explicit value handed to the engine at construction.
//! It is loaded from `BILLING_` prefixed environment variables:
//!
//! * `BILLING_ROLE_TYPE_ID` - role type of the actor whose discounts and
//!   account currency apply (required)
//! * `BILLING_USE_SYSDEFAULT_CURRENCY` - always post in the system default
//!   currency (default: false)
//! * `BILLING_FALLBACK_CURRENCY` - currency used when no other is found
//! * `BILLING_ZERO_CHARGE_WORK_CODES` - comma separated work codes whose
//!   chargeable time is zeroed
//! * `BILLING_STRICT_DISCOUNT_PRIORITY` - reject ties at the highest
//!   discount priority instead of choosing by amount threshold (default: false)

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use core_kernel::{CurrencyCode, RoleTypeId, WorkCodeId};

use crate::error::{BillingError, BillingResult};

/// Environment prefix for billing settings
pub const ENV_PREFIX: &str = "BILLING";

/// Billing engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BillingConfig {
    /// Role type binding discount rules and account currency to the case's actor
    pub role_type_id: RoleTypeId,
    /// Post in the system default currency instead of the case's account currency
    pub use_system_default_currency: bool,
    /// Currency used when neither the system nor the case provides one
    pub fallback_currency: Option<CurrencyCode>,
    /// Work codes whose chargeable time is always zero
    pub zero_charge_work_codes: BTreeSet<WorkCodeId>,
    /// Treat a tie at the highest discount priority as a configuration error
    pub strict_discount_priority: bool,
}

#[derive(Debug, Deserialize)]
struct RawBillingConfig {
    role_type_id: Option<i32>,
    #[serde(default)]
    use_sysdefault_currency: bool,
    fallback_currency: Option<String>,
    zero_charge_work_codes: Option<String>,
    #[serde(default)]
    strict_discount_priority: bool,
}

impl BillingConfig {
    /// Creates a configuration with defaults for everything but the role type
    pub fn new(role_type_id: RoleTypeId) -> Self {
        Self {
            role_type_id,
            use_system_default_currency: false,
            fallback_currency: None,
            zero_charge_work_codes: BTreeSet::new(),
            strict_discount_priority: false,
        }
    }

    pub fn with_system_default_currency(mut self) -> Self {
        self.use_system_default_currency = true;
        self
    }

    pub fn with_fallback_currency(mut self, currency: CurrencyCode) -> Self {
        self.fallback_currency = Some(currency);
        self
    }

    pub fn with_zero_charge_work_code(mut self, work_code: WorkCodeId) -> Self {
        self.zero_charge_work_codes.insert(work_code);
        self
    }

    pub fn with_strict_discount_priority(mut self) -> Self {
        self.strict_discount_priority = true;
        self
    }

    /// Returns true if chargeable time for the work code is always zero
    pub fn is_zero_charge(&self, work_code: &WorkCodeId) -> bool {
        self.zero_charge_work_codes.contains(work_code)
    }

    /// Loads configuration from the environment, reading `.env` if present
    pub fn from_env() -> BillingResult<Self> {
        dotenvy::dotenv().ok();

        let settings = config::Config::builder()
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;
        Self::from_settings(settings)
    }

    /// Builds configuration from already assembled settings
    pub fn from_settings(settings: config::Config) -> BillingResult<Self> {
        let raw: RawBillingConfig = settings.try_deserialize()?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawBillingConfig) -> BillingResult<Self> {
        let role_type_id = match raw.role_type_id {
            Some(id) if id > 0 => RoleTypeId::new(id),
            Some(id) => {
                return Err(BillingError::Configuration(format!(
                    "{}_ROLE_TYPE_ID must be positive, got {}",
                    ENV_PREFIX, id
                )))
            }
            None => {
                return Err(BillingError::Configuration(format!(
                    "Required configuration param {}_ROLE_TYPE_ID is not set",
                    ENV_PREFIX
                )))
            }
        };

        let fallback_currency = raw
            .fallback_currency
            .filter(|code| !code.trim().is_empty())
            .map(|code| {
                CurrencyCode::new(&code).map_err(|e| {
                    BillingError::Configuration(format!("{}_FALLBACK_CURRENCY: {}", ENV_PREFIX, e))
                })
            })
            .transpose()?;

        let zero_charge_work_codes = raw
            .zero_charge_work_codes
            .unwrap_or_default()
            .split(',')
            .map(WorkCodeId::new)
            .filter(|code| !code.is_blank())
            .collect();

        Ok(Self {
            role_type_id,
            use_system_default_currency: raw.use_sysdefault_currency,
            fallback_currency,
            zero_charge_work_codes,
            strict_discount_priority: raw.strict_discount_priority,
        })
    }
}
