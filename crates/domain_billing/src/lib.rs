//! Billing Domain - Resolution of Time-Based Charges
//!
//! This crate computes what a unit of work on a case is billed at. Given a
//! case, a work code, a login and the hours worked it resolves:
//!
//! - the hourly rate, from a fixed work-code rate, price lists or person rates
//! - the posting currency
//! - the applicable discount or markup rule, by criteria priority and amount
//!   threshold
//! - the final charge and the ledger rows recording it
//!
//! # Discount Priority
//!
//! A discount rule may constrain case type, state, application type, work
//! code and work-code type. Each constrained attribute contributes a fixed
//! weight so that rules rank lexicographically by which attributes they pin:
//!
//! | criterion        | weight |
//! |------------------|--------|
//! | case type        | 16     |
//! | state            | 8      |
//! | application type | 4      |
//! | work code        | 2      |
//! | work-code type T | 1      |
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_billing::{BillingConfig, BillingEngine, BillingRequest, WorkedHours};
//!
//! let engine = BillingEngine::new(port, BillingConfig::from_env()?);
//! let hours = WorkedHours::billable(dec!(2.5));
//! let request = BillingRequest::new(case_id, work_code, login, hours, today);
//! let outcome = engine.bill(&request)?;
//! store.insert(outcome.budget_line)?;
//! ```

pub mod charge;
pub mod config;
pub mod discount;
pub mod error;
pub mod formula;
pub mod hours;
pub mod model;
pub mod ports;
pub mod posting;
pub mod priority;
pub mod rate;

pub use charge::{AppliedDiscount, ChargeBreakdown, ChargeComputer};
pub use config::BillingConfig;
pub use discount::DiscountMatcher;
pub use error::{BillingError, BillingResult};
pub use formula::Formula;
pub use hours::WorkedHours;
pub use model::{Case, DiscountKind, DiscountRule, Person, PersonRate, PriceListEntry, WorkCode};
pub use ports::BillingReferencePort;
pub use posting::{
    BillingEngine, BillingOutcome, BillingRequest, BudgetLineDraft, TimeRegistrationDraft,
};
pub use rate::{RateLevel, RateQuote, RateResolver};
