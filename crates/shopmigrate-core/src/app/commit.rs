//! Commit phase - sequential finalization after the extraction barrier.
//!
//! # Flow
//! 1. SourceLifecycle::quiesce() stops the legacy system
//! 2. DataRelocator::move_directory() moves its data directory aside
//! 3. TargetStore::register() + mark_dirty() for every staged draft
//! 4. TargetStore::flush() for every dirty shop in the store, then wait
//!
//! Only step 4 fans out, and only into the store's own flush futures. Nothing
//! here is retried; the store owns retrying flushes.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use super::StagedDrafts;
use crate::domain::{CommitReport, RunState, TargetRecord};
use crate::ports::{DataRelocator, ProgressReporter, SourceLifecycle, TargetStore};

/// Where the legacy data directory goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelocationPlan {
    pub from: PathBuf,
    pub to: PathBuf,
}

pub struct CommitPhase {
    lifecycle: Arc<dyn SourceLifecycle>,
    relocator: Arc<dyn DataRelocator>,
    store: Arc<dyn TargetStore>,
    progress: Arc<dyn ProgressReporter>,
    relocation: RelocationPlan,
}

impl CommitPhase {
    pub fn new(
        lifecycle: Arc<dyn SourceLifecycle>,
        relocator: Arc<dyn DataRelocator>,
        store: Arc<dyn TargetStore>,
        progress: Arc<dyn ProgressReporter>,
        relocation: RelocationPlan,
    ) -> Self {
        Self {
            lifecycle,
            relocator,
            store,
            progress,
            relocation,
        }
    }

    pub fn relocation(&self) -> &RelocationPlan {
        &self.relocation
    }

    /// Run the commit phase. Must only be called once the barrier has fired.
    pub async fn run(&self, drafts: StagedDrafts, state: &watch::Sender<RunState>) -> CommitReport {
        let mut report = CommitReport::default();
        state.send_replace(RunState::Committing);

        self.progress
            .report("unloading legacy shop system", 0, drafts.len());
        self.lifecycle.quiesce();

        let RelocationPlan { from, to } = &self.relocation;
        if let Err(e) = self.relocator.move_directory(from, to).await {
            warn!(
                from = %from.display(),
                to = %to.display(),
                "failed to move legacy data directory, move it manually to avoid issues: {e}"
            );
            report.relocation_failed = true;
        }

        self.register_all(&drafts, &mut report);

        state.send_replace(RunState::Flushing);
        self.flush_dirty(&mut report).await;

        report
    }

    fn register_all(&self, drafts: &StagedDrafts, report: &mut CommitReport) {
        let total = drafts.len();
        for (i, draft) in drafts.iter().enumerate() {
            self.progress
                .report(&format!("registering {draft}"), i + 1, total);
            let registered = match self.store.register(draft.clone()) {
                Ok(registered) => registered,
                Err(e) => {
                    warn!(coordinate = %draft.coordinate, "failed to register shop: {e}");
                    report.register_failed += 1;
                    continue;
                }
            };
            if let Err(e) = self.store.mark_dirty(registered.id) {
                warn!(shop_id = %registered.id, "failed to mark shop dirty: {e}");
            }
            debug!(shop_id = %registered.id, coordinate = %registered.coordinate, "shop registered");
            report.registered += 1;
        }
    }

    async fn flush_dirty(&self, report: &mut CommitReport) {
        // Every dirty shop, not just the ones registered above.
        let dirty: Vec<TargetRecord> = self
            .store
            .list_all()
            .into_iter()
            .filter(|r| r.dirty)
            .collect();
        let total = dirty.len();
        report.flush_requested = total;
        self.progress.report("saving shops", 0, total);

        let mut joins = JoinSet::new();
        for record in dirty {
            let store = Arc::clone(&self.store);
            joins.spawn(async move {
                let result = store.flush(&record).await;
                (record, result)
            });
        }

        // No timeout: a store that never settles a flush stalls commit here.
        while let Some(joined) = joins.join_next().await {
            match joined {
                Ok((_, Ok(()))) => {}
                Ok((record, Err(e))) => {
                    warn!(shop_id = %record.id, "failed to save shop, it stays dirty: {e}");
                    report.flush_failed += 1;
                }
                Err(e) => {
                    error!("error while saving shops: {e}");
                    report.flush_wait_failed = true;
                    // Flushes still in flight keep running in the background.
                    joins.detach_all();
                    return;
                }
            }
        }

        if total != 0 {
            info!("saved {} shops", total - report.flush_failed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::StagingList;
    use crate::impls::{FlushFault, InMemoryLegacySource, InMemoryTargetStore, RetryPolicy};
    use crate::testing::{RecordingProgress, RecordingRelocator, at, draft};

    struct Fixture {
        source: Arc<InMemoryLegacySource>,
        relocator: Arc<RecordingRelocator>,
        store: Arc<InMemoryTargetStore>,
        progress: Arc<RecordingProgress>,
        phase: CommitPhase,
    }

    fn fixture(relocation_fails: bool) -> Fixture {
        let source = Arc::new(InMemoryLegacySource::new(vec![]));
        let relocator = Arc::new(if relocation_fails {
            RecordingRelocator::failing()
        } else {
            RecordingRelocator::default()
        });
        let store = Arc::new(InMemoryTargetStore::new(RetryPolicy::no_retry()));
        let progress = Arc::new(RecordingProgress::default());
        let phase = CommitPhase::new(
            source.clone(),
            relocator.clone(),
            store.clone(),
            progress.clone(),
            RelocationPlan {
                from: PathBuf::from("data/QuickShop"),
                to: PathBuf::from("data/QuickShop.migrated"),
            },
        );
        Fixture {
            source,
            relocator,
            store,
            progress,
            phase,
        }
    }

    fn staged(xs: &[i32]) -> StagedDrafts {
        let staging = StagingList::new();
        for &x in xs {
            let mut d = draft(x);
            d.set_dirty();
            staging.push(d);
        }
        staging.seal()
    }

    #[tokio::test]
    async fn registers_and_flushes_every_draft() {
        let f = fixture(false);
        let (state, _rx) = watch::channel(RunState::Barrier);

        let report = f.phase.run(staged(&[1, 2, 3]), &state).await;

        assert!(f.source.is_quiesced());
        assert_eq!(f.relocator.moves().len(), 1);
        assert_eq!(report.registered, 3);
        assert_eq!(report.flush_requested, 3);
        assert_eq!(report.flush_failed, 0);
        assert!(!report.has_warnings());
        assert_eq!(f.store.len(), 3);
        assert_eq!(f.store.dirty_count(), 0);
        assert_eq!(*state.borrow(), RunState::Flushing);
    }

    #[tokio::test]
    async fn relocation_failure_is_not_fatal() {
        let f = fixture(true);
        let (state, _rx) = watch::channel(RunState::Barrier);

        let report = f.phase.run(staged(&[1]), &state).await;

        assert!(report.relocation_failed);
        assert_eq!(report.registered, 1);
        assert_eq!(f.store.dirty_count(), 0);
    }

    #[tokio::test]
    async fn flush_sweeps_unrelated_dirty_shops() {
        let f = fixture(false);
        let mut pending = draft(50);
        pending.set_dirty();
        f.store.register(pending).unwrap();
        f.store.register(draft(51)).unwrap();
        let (state, _rx) = watch::channel(RunState::Barrier);

        let report = f.phase.run(staged(&[1, 2]), &state).await;

        assert_eq!(report.registered, 2);
        assert_eq!(report.flush_requested, 3);
        assert_eq!(f.store.dirty_count(), 0);
    }

    #[tokio::test]
    async fn failed_flush_leaves_shop_registered_and_dirty() {
        let f = fixture(false);
        f.store
            .inject_flush_fault(at(2), FlushFault::Always);
        let (state, _rx) = watch::channel(RunState::Barrier);

        let report = f.phase.run(staged(&[1, 2]), &state).await;

        assert_eq!(report.registered, 2);
        assert_eq!(report.flush_failed, 1);
        assert!(report.has_warnings());
        assert_eq!(f.store.len(), 2);
        assert_eq!(f.store.dirty_count(), 1);
        assert!(f.store.lookup(&at(2)).unwrap().dirty);
    }

    #[tokio::test]
    async fn crashed_flush_ends_the_wait_but_keeps_registrations() {
        let f = fixture(false);
        f.store
            .inject_flush_fault(at(1), FlushFault::Panic);
        let (state, _rx) = watch::channel(RunState::Barrier);

        let report = f.phase.run(staged(&[1]), &state).await;

        assert!(report.flush_wait_failed);
        assert_eq!(report.registered, 1);
        assert_eq!(f.store.len(), 1);
    }

    #[tokio::test]
    async fn occupied_coordinate_at_commit_is_counted() {
        let f = fixture(false);
        // Live system registered a shop after the conflict check ran.
        f.store.register(draft(1)).unwrap();
        let (state, _rx) = watch::channel(RunState::Barrier);

        let report = f.phase.run(staged(&[1, 2]), &state).await;

        assert_eq!(report.registered, 1);
        assert_eq!(report.register_failed, 1);
        assert_eq!(f.store.len(), 2);
    }

    #[tokio::test]
    async fn empty_staging_still_quiesces_and_relocates() {
        let f = fixture(false);
        let (state, _rx) = watch::channel(RunState::Barrier);

        let report = f.phase.run(staged(&[]), &state).await;

        assert!(f.source.is_quiesced());
        assert_eq!(f.relocator.moves().len(), 1);
        assert_eq!(report, CommitReport::default());
        let events = f.progress.events();
        assert!(events.iter().any(|(m, _, total)| m == "saving shops" && *total == 0));
    }
}
