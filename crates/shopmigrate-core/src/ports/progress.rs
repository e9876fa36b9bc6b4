//! ProgressReporter port - operator-facing progress messages.

/// Receives human-readable progress. Has no effect on control flow.
///
/// Implementations must not block and must not fail: the pipeline calls this
/// from extraction workers and from the commit phase alike.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, message: &str, current: usize, total: usize);
}

/// Drops every message.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _message: &str, _current: usize, _total: usize) {}
}
