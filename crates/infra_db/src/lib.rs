//! Infrastructure Database Layer
//!
//! PostgreSQL persistence for crew ops using SQLx: connection pool, embedded
//! migrations, repositories, and the adapters implementing the domain ports.
//!
//! # Atomic Status Changes
//!
//! Claim status changes are single `UPDATE ... WHERE claim_id = $1 AND
//! status = $2 RETURNING ...` statements. Two concurrent approvals of the
//! same pending claim therefore produce exactly one updated row.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{DatabaseConfig, create_pool, run_migrations};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/crew_ops")).await?;
//! run_migrations(&pool).await?;
//! ```

pub mod pool;
pub mod error;
pub mod repositories;
pub mod adapters;

pub use pool::{DatabasePool, DatabaseConfig, create_pool, run_migrations, ping};
pub use error::DatabaseError;
pub use adapters::{PostgresClaimsAdapter, PostgresApproverDirectory, PostgresPayrollStore};
