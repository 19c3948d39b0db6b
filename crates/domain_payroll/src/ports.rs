//! Payroll store port
//!
//! Each method is one write path into the backing store. Implementations
//! report missing rows as `PortError::NotFound`, constraint clashes as
//! `PortError::Conflict`, and write paths the store does not offer (e.g. the
//! stored procedure is not installed) as `PortError::Unsupported`.

use async_trait::async_trait;

use core_kernel::{DomainPort, PayrollEntryId, PortError};
use crate::model::{PayrollRecord, PayrollUpdate};

#[async_trait]
pub trait PayrollStore: DomainPort {
    /// Writes through the store's payroll procedure
    async fn save_via_procedure(&self, update: &PayrollUpdate) -> Result<PayrollRecord, PortError>;

    /// Overwrites the working days of an existing project staff entry
    async fn update_staff_entry(
        &self,
        entry_id: PayrollEntryId,
        update: &PayrollUpdate,
    ) -> Result<PayrollRecord, PortError>;

    /// Creates a new project staff entry
    async fn insert_staff_entry(&self, update: &PayrollUpdate) -> Result<PayrollRecord, PortError>;

    /// Stores the payroll on the candidate record
    async fn update_candidate_payroll(&self, update: &PayrollUpdate) -> Result<PayrollRecord, PortError>;
}
