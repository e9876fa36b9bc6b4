//! SourceLifecycle port - stopping the legacy system before commit.

/// Lifecycle control over the legacy system.
pub trait SourceLifecycle: Send + Sync {
    /// Disable the legacy system so it stops mutating its shops.
    /// Calling it again on an already quiesced source is a no-op.
    fn quiesce(&self);
}
