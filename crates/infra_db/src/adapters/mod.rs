//! Domain Adapters
//!
//! Port implementations over PostgreSQL. Each adapter wraps a repository and
//! converts rows to domain types and database errors to `PortError`.
//!
//! ```rust,ignore
//! use infra_db::adapters::{PostgresClaimsAdapter, PostgresApproverDirectory};
//! use domain_expenses::ClaimApprovalService;
//!
//! let claims = Arc::new(PostgresClaimsAdapter::new(pool.clone()));
//! let service = ClaimApprovalService::new(
//!     claims.clone(),
//!     Arc::new(PostgresApproverDirectory::new(pool)),
//!     claims,
//! );
//! ```

pub mod claims;
pub mod approvers;
pub mod payroll;

pub use claims::PostgresClaimsAdapter;
pub use approvers::PostgresApproverDirectory;
pub use payroll::PostgresPayrollStore;
