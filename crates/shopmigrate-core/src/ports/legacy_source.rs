//! LegacySource port - the system being migrated away from.

use crate::domain::LegacyRecord;

/// Read access to the legacy shop population.
pub trait LegacySource: Send + Sync {
    /// Point-in-time snapshot of every legacy shop. Shops added after the call
    /// are not included.
    fn list_all(&self) -> Vec<LegacyRecord>;
}
