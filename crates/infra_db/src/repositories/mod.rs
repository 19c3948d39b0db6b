//! Repository implementations
//!
//! Repositories encapsulate SQL and map rows to plain row structs; the
//! adapters in [`crate::adapters`] convert those to domain types.
//!
//! Queries are built at runtime with `sqlx::query_as` so the crate compiles
//! without a live database.

pub mod claims;
pub mod approvers;
pub mod payroll;

pub use claims::ClaimsRepository;
pub use approvers::ApproverRepository;
pub use payroll::PayrollRepository;
