//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! crew operations test suite.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built test data for users, money, and dates
//! - `builders`: Builder patterns for claims, receipts, and payroll updates
//! - `database`: Database test helpers and container management
//! - `assertions`: Custom assertion helpers for domain types
//! - `generators`: Property-based test data generators

pub mod fixtures;
pub mod builders;
pub mod database;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use database::*;
pub use assertions::*;
pub use generators::*;
