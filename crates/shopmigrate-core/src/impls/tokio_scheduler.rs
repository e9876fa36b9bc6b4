//! Batch scheduler on tokio's blocking pool.
//!
//! Items run through `spawn_blocking` (per-item work may block), gated by a
//! semaphore so at most `max_parallel` run at once. A driver task drains the
//! JoinSet and fires the completion once every item has settled.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::ports::{BatchCompletion, BatchScheduler, BatchSummary, ItemFn};

#[derive(Debug, Clone)]
pub struct TokioBatchScheduler {
    max_parallel: usize,
}

impl TokioBatchScheduler {
    /// `max_parallel` is clamped to at least 1.
    pub fn new(max_parallel: usize) -> Self {
        Self {
            max_parallel: max_parallel.max(1),
        }
    }

    pub fn max_parallel(&self) -> usize {
        self.max_parallel
    }
}

impl<T: Send + 'static> BatchScheduler<T> for TokioBatchScheduler {
    /// Must be called from within a tokio runtime.
    fn submit(&self, items: Vec<T>, per_item: ItemFn<T>) -> BatchCompletion {
        let (signal, completion) = BatchCompletion::channel();
        let permits = Arc::new(Semaphore::new(self.max_parallel));
        let submitted = items.len();

        tokio::spawn(async move {
            let mut joins = JoinSet::new();
            for item in items {
                // The semaphore is never closed, so acquire only fails if that changes.
                let Ok(permit) = Arc::clone(&permits).acquire_owned().await else {
                    warn!("scheduler semaphore closed, remaining items dropped");
                    break;
                };
                let work = Arc::clone(&per_item);
                joins.spawn_blocking(move || {
                    let _permit = permit;
                    work(item);
                });
            }

            let mut summary = BatchSummary {
                submitted,
                ..BatchSummary::default()
            };
            while let Some(joined) = joins.join_next().await {
                match joined {
                    Ok(()) => summary.completed += 1,
                    Err(e) => {
                        summary.panicked += 1;
                        warn!(error = %e, "batch item panicked");
                    }
                }
            }
            debug!(?summary, "batch drained");
            signal.fire(summary);
        });

        completion
    }
}
