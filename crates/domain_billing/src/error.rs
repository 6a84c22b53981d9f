//! Billing domain errors
//!
//! Every variant except [`BillingError::Store`] describes a data or
//! configuration problem in the case-management system. Those are permanent
//! for the record being billed; the batch moves on to the next record and an
//! operator fixes the data using the identifiers carried in the message.

use core_kernel::{CaseId, LoginId, PortError, WorkCodeId};
use thiserror::Error;

/// Errors that can occur while resolving a billing charge
#[derive(Debug, Error)]
pub enum BillingError {
    /// No level of the rate fallback chain produced an hourly rate
    #[error("No hourly rate is found for login '{login}' and work code '{work_code}'")]
    RateNotFound {
        login: LoginId,
        work_code: WorkCodeId,
    },

    /// Neither the case's account nor the fallback configuration yielded a currency
    #[error(
        "Could not find currency for the case {case_number}. \
         Please make sure an account address is configured for this case"
    )]
    CurrencyNotFound {
        case_number: String,
    },

    /// The system default currency was requested but none is registered
    #[error("Could not find the system default currency for case {case_number}")]
    SystemCurrencyNotFound {
        case_number: String,
    },

    /// A discount rule carries a kind other than pure discount or markup
    #[error("Unknown discount type {0}")]
    UnknownDiscountKind(i32),

    /// A discount formula could not be parsed or evaluated
    #[error("Invalid discount formula '{formula}': {reason}")]
    Formula {
        formula: String,
        reason: String,
    },

    /// Two or more discount rules share the highest priority for a case
    #[error(
        "Indistinct discount policy for case {case_number} detected \
         ({count} rules at priority {priority}). Please resolve."
    )]
    AmbiguousDiscountPolicy {
        case_number: String,
        priority: u8,
        count: usize,
    },

    /// The case being billed does not exist
    #[error("Case not found: {0}")]
    CaseNotFound(CaseId),

    /// Invalid posting input
    #[error("Invalid posting: {0}")]
    InvalidPosting(String),

    /// Configuration is missing or malformed
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Reading reference data failed
    #[error("Reference data error: {0}")]
    Store(#[from] PortError),
}

impl BillingError {
    /// Creates a Formula error for the given raw formula
    pub fn formula(formula: impl Into<String>, reason: impl Into<String>) -> Self {
        BillingError::Formula {
            formula: formula.into(),
            reason: reason.into(),
        }
    }

    /// Returns true if retrying the same record cannot succeed without a data fix
    pub fn is_permanent(&self) -> bool {
        match self {
            BillingError::Store(source) => !source.is_transient(),
            _ => true,
        }
    }
}

impl From<config::ConfigError> for BillingError {
    fn from(error: config::ConfigError) -> Self {
        BillingError::Configuration(error.to_string())
    }
}

/// Result alias for billing operations
pub type BillingResult<T> = Result<T, BillingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_not_found_names_login_and_work_code() {
        let error = BillingError::RateNotFound {
            login: LoginId::new("jdoe"),
            work_code: WorkCodeId::new("FEE"),
        };
        let message = error.to_string();
        assert!(message.contains("jdoe"));
        assert!(message.contains("FEE"));
    }

    #[test]
    fn test_formula_error_carries_raw_formula() {
        let error = BillingError::formula("@ * (0,1", "unclosed parenthesis");
        assert!(error.to_string().contains("@ * (0,1"));
    }

    #[test]
    fn test_business_errors_are_permanent() {
        assert!(BillingError::UnknownDiscountKind(7).is_permanent());
        assert!(BillingError::CaseNotFound(CaseId::new(1)).is_permanent());
    }

    #[test]
    fn test_transient_store_errors_are_not_permanent() {
        let error: BillingError = PortError::connection("refused").into();
        assert!(!error.is_permanent());

        let error: BillingError = PortError::transformation("bad row").into();
        assert!(error.is_permanent());
    }
}
