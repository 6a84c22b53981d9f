//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! billing engine test suite.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built cases, dates and identifiers
//! - `builders`: Builders for discount rules, price lists and reference data
//! - `assertions`: Decimal and charge breakdown assertions
//! - `generators`: Property-based test data generators
//! - `tracing`: One-time tracing subscriber setup

pub mod fixtures;
pub mod builders;
pub mod assertions;
pub mod generators;
pub mod tracing;

pub use fixtures::*;
pub use builders::*;
pub use assertions::*;
pub use generators::*;
pub use tracing::init_test_tracing;
