//! Record validator: the shop's container must still exist.

use std::sync::Arc;

use crate::domain::{Container, LegacyRecord, MigrationError};
use crate::ports::ContainerResolver;

#[derive(Clone)]
pub struct Validator {
    containers: Arc<dyn ContainerResolver>,
}

impl Validator {
    pub fn new(containers: Arc<dyn ContainerResolver>) -> Self {
        Self { containers }
    }

    /// The live container backing `record`, or `InvalidContainer`.
    pub fn validate(&self, record: &LegacyRecord) -> Result<Container, MigrationError> {
        self.containers
            .resolve(&record.coordinate)
            .ok_or_else(|| MigrationError::InvalidContainer(record.coordinate.clone()))
    }
}
