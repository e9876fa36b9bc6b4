//! BatchScheduler port - fan-out of per-item work with a join barrier.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::domain::MigrationError;

/// Per-item work. Synchronous: items may block (identity lookups), so
/// schedulers are expected to run them off the async executor.
pub type ItemFn<T> = Arc<dyn Fn(T) + Send + Sync>;

/// What the scheduler observed while draining a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub submitted: usize,
    pub completed: usize,

    /// Items whose work panicked. They count as processed.
    pub panicked: usize,
}

/// Distributes items over execution units.
///
/// The scheduler owns the parallelism degree. It must process every submitted
/// item exactly once and fire the completion only after the last one settles.
/// A panicking item counts as settled and must not stop the rest of the batch.
/// The migrator's item work catches its own panics, so inline schedulers work.
pub trait BatchScheduler<T: Send + 'static>: Send + Sync {
    fn submit(&self, items: Vec<T>, per_item: ItemFn<T>) -> BatchCompletion;
}

/// Join barrier handed back by `BatchScheduler::submit`.
#[derive(Debug)]
pub struct BatchCompletion {
    rx: oneshot::Receiver<BatchSummary>,
}

/// Scheduler-side half of a `BatchCompletion`.
#[derive(Debug)]
pub struct CompletionSignal {
    tx: oneshot::Sender<BatchSummary>,
}

impl BatchCompletion {
    pub fn channel() -> (CompletionSignal, BatchCompletion) {
        let (tx, rx) = oneshot::channel();
        (CompletionSignal { tx }, BatchCompletion { rx })
    }

    /// A completion that has already fired.
    pub fn ready(summary: BatchSummary) -> Self {
        let (signal, completion) = Self::channel();
        signal.fire(summary);
        completion
    }

    /// Wait for the barrier. Fails if the scheduler went away without firing.
    pub async fn wait(self) -> Result<BatchSummary, MigrationError> {
        self.rx.await.map_err(|_| MigrationError::BarrierBroken)
    }
}

impl CompletionSignal {
    pub fn fire(self, summary: BatchSummary) {
        // ignore send error: nobody is waiting anymore
        let _ = self.tx.send(summary);
    }
}
