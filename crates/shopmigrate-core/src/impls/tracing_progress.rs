//! Progress reporter that writes through `tracing`.

use tracing::info;

use crate::ports::ProgressReporter;

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingProgress;

impl ProgressReporter for TracingProgress {
    fn report(&self, message: &str, current: usize, total: usize) {
        info!(target: "shopmigrate::progress", current, total, "{message}");
    }
}
