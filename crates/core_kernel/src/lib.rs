//! Core Kernel - Foundational types shared by the crew operations crates
//!
//! This crate provides the building blocks used across all domain modules:
//! - Money types with precise decimal arithmetic
//! - Strongly-typed identifiers
//! - Port traits and the unified port error for adapters

pub mod money;
pub mod identifiers;
pub mod ports;

pub use money::{Money, Currency, MoneyError};
pub use identifiers::{
    ClaimId, ReceiptId, ProjectId, UserId, CandidateId, PayrollEntryId, AuditEventId,
};
pub use ports::{
    PortError, DomainPort, HealthCheckable, HealthCheckResult, AdapterHealth, OperationMetadata,
};
