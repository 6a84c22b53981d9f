//! Core Kernel - Foundational types shared by the billing crates
//!
//! This crate provides the building blocks used across domain modules:
//! - Strongly-typed identifiers for cases, actors, logins and work codes
//! - Currency codes and half-up decimal rounding at ledger scale
//! - Port infrastructure for reading reference data from collaborators

pub mod money;
pub mod identifiers;
pub mod ports;

pub use money::{
    CurrencyCode, MoneyError, round_half_up, round_amount, round_percentage,
    AMOUNT_SCALE, PERCENTAGE_SCALE,
};
pub use identifiers::{
    CaseId, CaseTypeId, ApplicationTypeId, StateId,
    ActorId, RoleTypeId, LoginId, WorkCodeId, DiscountId,
};
pub use ports::{PortError, DomainPort};
