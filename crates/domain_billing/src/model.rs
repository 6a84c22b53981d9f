//! Reference data read from the case-management system
//!
//! These values are constructed from query results at the start of a billing
//! computation and dropped once the outcome is handed off. Nothing here is
//! mutated after loading.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{
    ActorId, ApplicationTypeId, CaseId, CaseTypeId, CurrencyCode, DiscountId, LoginId,
    RoleTypeId, StateId, WorkCodeId,
};

use crate::error::BillingError;
use crate::priority;

/// Work-code type of plain time entries; the only type discounts may be restricted to
pub const TIME_WORK_CODE_TYPE: &str = "T";

/// A billable matter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Case {
    pub id: CaseId,
    /// Human-readable case number, used in operator-facing messages
    pub case_number: String,
    pub catch_word: Option<String>,
    pub case_type_id: CaseTypeId,
    pub state_id: StateId,
    pub application_type_id: ApplicationTypeId,
}

impl Case {
    pub fn new(
        id: CaseId,
        case_number: impl Into<String>,
        case_type_id: CaseTypeId,
        state_id: StateId,
        application_type_id: ApplicationTypeId,
    ) -> Self {
        Self {
            id,
            case_number: case_number.into(),
            catch_word: None,
            case_type_id,
            state_id,
            application_type_id,
        }
    }

    pub fn with_catch_word(mut self, catch_word: impl Into<String>) -> Self {
        self.catch_word = Some(catch_word.into());
        self
    }
}

/// A type of billable activity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkCode {
    pub id: WorkCodeId,
    pub text: String,
    /// Flat amount registered on the work code
    pub default_amount: Option<Decimal>,
    /// When set, `default_amount` replaces every other hourly rate
    pub replace_amount: bool,
}

impl WorkCode {
    pub fn new(id: WorkCodeId, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            default_amount: None,
            replace_amount: false,
        }
    }

    /// Flags the work code as carrying an overriding flat rate
    pub fn with_fixed_rate(mut self, rate: Decimal) -> Self {
        self.default_amount = Some(rate);
        self.replace_amount = true;
        self
    }

    /// Returns the flat rate if it overrides all other rate sources
    pub fn fixed_rate(&self) -> Option<Decimal> {
        if self.replace_amount {
            self.default_amount
        } else {
            None
        }
    }
}

/// One row of a price list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceListEntry {
    /// Category specificity; higher values are more specific
    pub category_level: u8,
    /// Actor the row is negotiated for; `None` is the default actor
    pub actor_id: Option<ActorId>,
    /// Login the row applies to; `None` applies to every login
    pub login_id: Option<LoginId>,
    pub currency: CurrencyCode,
    pub hourly_rate: Decimal,
    /// Date of the last price change
    pub effective_date: NaiveDate,
}

/// Person-specific hourly rate override
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRate {
    pub login_id: LoginId,
    pub role_type_id: Option<RoleTypeId>,
    pub work_code_id: Option<WorkCodeId>,
    pub hourly_rate: Decimal,
}

/// A person registered in the case-management system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub login_id: LoginId,
    pub email: Option<String>,
    /// Default hourly rate, the last fallback of the rate chain
    pub hourly_rate: Option<Decimal>,
}

/// How a discount rule adjusts the charge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountKind {
    /// Subtract the formula result from the charge
    Pure,
    /// Add the formula result to the charge
    Markup,
}

impl DiscountKind {
    /// Code stored for pure discounts
    pub const PURE_CODE: i32 = 1;
    /// Code stored for markups
    pub const MARKUP_CODE: i32 = 2;

    pub fn code(&self) -> i32 {
        match self {
            DiscountKind::Pure => Self::PURE_CODE,
            DiscountKind::Markup => Self::MARKUP_CODE,
        }
    }
}

impl TryFrom<i32> for DiscountKind {
    type Error = BillingError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            Self::PURE_CODE => Ok(DiscountKind::Pure),
            Self::MARKUP_CODE => Ok(DiscountKind::Markup),
            other => Err(BillingError::UnknownDiscountKind(other)),
        }
    }
}

/// A billing policy describing when and how to adjust a charge
///
/// Unset criteria are wildcards. The discount type is kept as the raw stored
/// code so that an unrecognized value surfaces only when the rule is
/// actually selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountRule {
    pub id: DiscountId,
    pub case_type_id: Option<CaseTypeId>,
    pub state_id: Option<StateId>,
    pub application_type_id: Option<ApplicationTypeId>,
    pub work_code_id: Option<WorkCodeId>,
    pub work_code_type: Option<String>,
    pub discount_type: i32,
    /// Minimum undiscounted amount the rule applies to
    pub amount_threshold: Decimal,
    /// Arithmetic formula over `@`, the undiscounted amount
    pub formula: String,
}

impl DiscountRule {
    /// Creates a rule with every match criterion unset
    pub fn new(
        id: DiscountId,
        discount_type: i32,
        amount_threshold: Decimal,
        formula: impl Into<String>,
    ) -> Self {
        Self {
            id,
            case_type_id: None,
            state_id: None,
            application_type_id: None,
            work_code_id: None,
            work_code_type: None,
            discount_type,
            amount_threshold,
            formula: formula.into(),
        }
    }

    pub fn with_case_type(mut self, case_type_id: CaseTypeId) -> Self {
        self.case_type_id = Some(case_type_id);
        self
    }

    pub fn with_state(mut self, state_id: StateId) -> Self {
        self.state_id = Some(state_id);
        self
    }

    pub fn with_application_type(mut self, application_type_id: ApplicationTypeId) -> Self {
        self.application_type_id = Some(application_type_id);
        self
    }

    pub fn with_work_code(mut self, work_code_id: WorkCodeId) -> Self {
        self.work_code_id = Some(work_code_id);
        self
    }

    pub fn with_work_code_type(mut self, work_code_type: impl Into<String>) -> Self {
        self.work_code_type = Some(work_code_type.into());
        self
    }

    /// State criterion, treating a blank state as unset
    pub fn state_criterion(&self) -> Option<&StateId> {
        self.state_id.as_ref().filter(|state| !state.is_blank())
    }

    /// Work-code criterion, treating a blank code as unset
    pub fn work_code_criterion(&self) -> Option<&WorkCodeId> {
        self.work_code_id.as_ref().filter(|code| !code.is_blank())
    }

    /// Work-code type criterion, treating a blank type as unset
    pub fn work_code_type_criterion(&self) -> Option<&str> {
        self.work_code_type
            .as_deref()
            .map(str::trim)
            .filter(|kind| !kind.is_empty())
    }

    /// Specificity rank of this rule
    pub fn priority(&self) -> u8 {
        priority::priority(
            self.case_type_id.is_some(),
            self.state_criterion().is_some(),
            self.application_type_id.is_some(),
            self.work_code_criterion().is_some(),
            self.work_code_type_criterion(),
        )
    }

    /// Returns true if every concrete case criterion equals the case's value
    pub fn matches_case(&self, case: &Case) -> bool {
        self.case_type_id.map_or(true, |id| id == case.case_type_id)
            && self.state_criterion().map_or(true, |id| *id == case.state_id)
            && self
                .application_type_id
                .map_or(true, |id| id == case.application_type_id)
    }

    /// Parses the stored discount type
    pub fn kind(&self) -> Result<DiscountKind, BillingError> {
        DiscountKind::try_from(self.discount_type)
    }
}
