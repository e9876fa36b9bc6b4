//! Migrator - drives one migration run.
//!
//! # Run lifecycle
//! ```text
//! NOT_STARTED -> EXTRACTING -> BARRIER -> COMMITTING -> FLUSHING -> DONE
//!                                                              \-> DONE_WITH_WARNINGS
//! ```
//! `spawn` snapshots the legacy source, submits one extraction task per
//! record and returns. A single continuation task waits for the scheduler's
//! completion, seals the staging list and runs the commit phase.
//!
//! Records added to the source after `spawn` belong to the next run.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, error, info, info_span};

use super::{CommitPhase, ExtractionTally, RecordPipeline, StagingList, Transformer, Validator};
use crate::domain::{
    CommitReport, ConflictPolicy, LegacyRecord, MigrationError, RunId, RunReport, RunState,
};
use crate::ports::{BatchScheduler, Clock, ItemFn, LegacySource, ProgressReporter, TargetStore};

/// Migrates legacy shops into the target store.
///
/// Built by `MigratorBuilder`. Holds no per-run state, so one migrator can
/// start any number of runs.
pub struct Migrator {
    pub(super) name: String,
    pub(super) owner: String,
    pub(super) priority: i32,
    pub(super) source: Arc<dyn LegacySource>,
    pub(super) store: Arc<dyn TargetStore>,
    pub(super) scheduler: Arc<dyn BatchScheduler<LegacyRecord>>,
    pub(super) validator: Validator,
    pub(super) transformer: Transformer,
    pub(super) policy: Arc<dyn ConflictPolicy>,
    pub(super) progress: Arc<dyn ProgressReporter>,
    pub(super) commit: Arc<CommitPhase>,
    pub(super) clock: Arc<dyn Clock>,
}

impl Migrator {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Start a run and return immediately. The outcome is only reported
    /// through logs and the returned handle.
    pub fn migrate(&self, override_existing: bool) -> bool {
        let run = self.spawn(override_existing);
        debug!(run_id = %run.run_id(), "migration detached");
        true
    }

    /// Start a run. Must be called from within a tokio runtime.
    pub fn spawn(&self, override_existing: bool) -> MigrationRun {
        let started_at = self.clock.now();
        let run_id = RunId::at(started_at);
        let span = info_span!("migration", %run_id, override_existing);

        let records = self.source.list_all();
        let total = records.len();
        let (state_tx, state_rx) = watch::channel(RunState::NotStarted);

        span.in_scope(|| info!(total, "starting shop migration"));
        self.progress.report("start migrating shops", 0, total);
        state_tx.send_replace(RunState::Extracting);

        let staging = Arc::new(StagingList::new());
        let tally = Arc::new(ExtractionTally::default());
        let pipeline = Arc::new(RecordPipeline::new(
            self.validator.clone(),
            Arc::clone(&self.policy),
            self.transformer.clone(),
            Arc::clone(&self.store),
            override_existing,
        ));

        let per_item: ItemFn<LegacyRecord> = {
            let staging = Arc::clone(&staging);
            let tally = Arc::clone(&tally);
            let progress = Arc::clone(&self.progress);
            let span = span.clone();
            Arc::new(move |record: LegacyRecord| {
                let _entered = span.enter();
                let attempted = tally.begin();
                progress.report(&format!("migrating {record}"), attempted, total);
                // A panicking collaborator loses this record only; the
                // tally counts it as lost at the barrier.
                let processed = panic::catch_unwind(AssertUnwindSafe(|| pipeline.process(&record)));
                let Ok((outcome, draft)) = processed else {
                    error!(coordinate = %record.coordinate, "shop migration task panicked: {record}");
                    return;
                };
                tally.record(&outcome);
                if let Some(draft) = draft {
                    staging.push(draft);
                }
            })
        };

        let completion = self.scheduler.submit(records, per_item);

        let continuation = Continuation {
            run_id,
            override_existing,
            total,
            started_at,
            staging,
            tally,
            commit: Arc::clone(&self.commit),
            clock: Arc::clone(&self.clock),
        };
        let handle = tokio::spawn(
            async move {
                let batch = completion.wait().await;
                continuation.finish(batch, state_tx).await
            }
            .instrument(span),
        );

        MigrationRun {
            run_id,
            state: state_rx,
            handle,
        }
    }
}

/// Everything the barrier continuation needs, moved into its task.
struct Continuation {
    run_id: RunId,
    override_existing: bool,
    total: usize,
    started_at: DateTime<Utc>,
    staging: Arc<StagingList>,
    tally: Arc<ExtractionTally>,
    commit: Arc<CommitPhase>,
    clock: Arc<dyn Clock>,
}

impl Continuation {
    async fn finish(
        self,
        batch: Result<crate::ports::BatchSummary, MigrationError>,
        state: watch::Sender<RunState>,
    ) -> RunReport {
        state.send_replace(RunState::Barrier);
        let drafts = self.staging.seal();

        let (commit, aborted) = match batch {
            Ok(summary) => {
                debug!(
                    submitted = summary.submitted,
                    panicked = summary.panicked,
                    staged = drafts.len(),
                    "extraction finished"
                );
                (self.commit.run(drafts, &state).await, false)
            }
            Err(e) => {
                error!("extraction did not complete, nothing was committed: {e}");
                (CommitReport::default(), true)
            }
        };

        let counted = self.tally.summary(self.total, 0);
        let settled = counted.staged + counted.skipped + counted.rejected;
        let extraction = self.tally.summary(self.total, self.total.saturating_sub(settled));

        let mut report = RunReport {
            run_id: self.run_id,
            override_existing: self.override_existing,
            state: RunState::Done,
            extraction,
            commit,
            aborted,
            started_at: self.started_at,
            finished_at: self.clock.now(),
        };
        report.state = report.final_state();
        state.send_replace(report.state);

        info!(
            state = ?report.state,
            staged = report.extraction.staged,
            skipped = report.extraction.skipped,
            rejected = report.extraction.rejected,
            registered = report.commit.registered,
            "shop migration finished"
        );
        report
    }
}

/// Handle to a running migration.
#[derive(Debug)]
pub struct MigrationRun {
    run_id: RunId,
    state: watch::Receiver<RunState>,
    handle: JoinHandle<RunReport>,
}

impl MigrationRun {
    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Latest state published by the run.
    pub fn state(&self) -> RunState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<RunState> {
        self.state.clone()
    }

    /// Wait for the run to end.
    pub async fn join(self) -> Result<RunReport, MigrationError> {
        self.handle
            .await
            .map_err(|e| MigrationError::Other(format!("migration task failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::MigratorBuilder;
    use crate::domain::{IdentityError, OwnerIdentity, ShopId};
    use crate::ports::IdentityResolver;
    use uuid::Uuid;
    use crate::impls::{
        FlushFault, InMemoryLegacySource, InMemoryTargetStore, RetryPolicy, StaticIdentities,
        StaticWorld, TokioBatchScheduler,
    };
    use crate::testing::{
        GatedScheduler, RecordingProgress, RecordingRelocator, at, draft, legacy,
    };

    struct Harness {
        source: Arc<InMemoryLegacySource>,
        store: Arc<InMemoryTargetStore>,
        relocator: Arc<RecordingRelocator>,
        progress: Arc<RecordingProgress>,
    }

    impl Harness {
        fn new(records: Vec<LegacyRecord>) -> Self {
            Self {
                source: Arc::new(InMemoryLegacySource::new(records)),
                store: Arc::new(InMemoryTargetStore::new(RetryPolicy::no_retry())),
                relocator: Arc::new(RecordingRelocator::default()),
                progress: Arc::new(RecordingProgress::default()),
            }
        }

        fn builder(&self, world: StaticWorld) -> MigratorBuilder {
            MigratorBuilder::new()
                .legacy(self.source.clone())
                .store(self.store.clone())
                .containers(Arc::new(world))
                .identities(Arc::new(StaticIdentities::lenient()))
                .relocator(self.relocator.clone())
                .progress(self.progress.clone())
        }

        fn migrator(&self, world: StaticWorld) -> Migrator {
            self.builder(world)
                .scheduler(Arc::new(TokioBatchScheduler::new(4)))
                .build()
                .unwrap()
        }

        fn mirrored_world(&self) -> StaticWorld {
            StaticWorld::mirroring(&self.source.list_all())
        }
    }

    #[tokio::test]
    async fn three_free_records_are_registered_and_flushed() {
        let h = Harness::new(vec![legacy(1), legacy(2), legacy(3)]);
        let migrator = h.migrator(h.mirrored_world());

        let report = migrator.spawn(false).join().await.unwrap();

        assert_eq!(report.state, RunState::Done);
        assert_eq!(report.extraction.staged, 3);
        assert_eq!(report.extraction.skipped, 0);
        assert_eq!(report.commit.registered, 3);
        assert_eq!(report.commit.flush_requested, 3);
        assert_eq!(h.store.flush_attempts(), 3);
        assert_eq!(h.store.len(), 3);
        assert_eq!(h.store.dirty_count(), 0);
        for x in 1..=3 {
            let shop = h.store.lookup(&at(x)).unwrap();
            assert!(shop.id.is_assigned());
            assert_eq!(shop.origin, "QuickShop-Hikari");
            assert!(h.store.durable(shop.id).is_some());
        }
    }

    #[tokio::test]
    async fn occupied_coordinate_is_skipped_without_override() {
        let h = Harness::new(vec![legacy(1), legacy(2)]);
        let existing = h.store.register(draft(1)).unwrap();
        let migrator = h.migrator(h.mirrored_world());

        let report = migrator.spawn(false).join().await.unwrap();

        assert_eq!(report.state, RunState::DoneWithWarnings);
        assert_eq!(report.extraction.staged, 1);
        assert_eq!(report.extraction.skipped, 1);
        assert_eq!(report.commit.registered, 1);
        assert!(h.store.deleted_ids().is_empty());
        assert_eq!(h.store.get(existing.id), Some(existing));
        assert_eq!(h.store.len(), 2);
    }

    #[tokio::test]
    async fn occupied_coordinate_is_replaced_with_override() {
        let h = Harness::new(vec![legacy(1), legacy(2)]);
        let existing = h.store.register(draft(1)).unwrap();
        let migrator = h.migrator(h.mirrored_world());

        let report = migrator.spawn(true).join().await.unwrap();

        assert_eq!(report.state, RunState::Done);
        assert_eq!(report.extraction.overwritten, 1);
        assert_eq!(report.commit.registered, 2);
        assert_eq!(report.commit.flush_requested, 2);
        assert_eq!(h.store.deleted_ids(), vec![existing.id]);
        assert_eq!(h.store.len(), 2);
        let replaced = h.store.lookup(&at(1)).unwrap();
        assert_ne!(replaced.id, existing.id);
        assert_eq!(replaced.origin, "QuickShop-Hikari");
    }

    #[tokio::test]
    async fn missing_container_is_rejected_and_commit_still_runs() {
        let h = Harness::new(vec![legacy(1)]);
        let migrator = h.migrator(StaticWorld::new());

        let report = migrator.spawn(false).join().await.unwrap();

        assert_eq!(report.extraction.rejected, 1);
        assert_eq!(report.commit.registered, 0);
        assert_eq!(report.commit.flush_requested, 0);
        assert!(!report.commit.has_warnings());
        assert!(h.source.is_quiesced());
        assert_eq!(h.relocator.moves().len(), 1);
        assert!(h.store.is_empty());
        assert_eq!(report.state, RunState::DoneWithWarnings);
    }

    #[tokio::test]
    async fn repeated_override_runs_keep_one_shop_per_coordinate() {
        let h = Harness::new(vec![legacy(1), legacy(2), legacy(3)]);
        let migrator = h.migrator(h.mirrored_world());

        migrator.spawn(true).join().await.unwrap();
        let second = migrator.spawn(true).join().await.unwrap();

        assert_eq!(second.extraction.overwritten, 3);
        assert_eq!(h.store.len(), 3);
        assert_eq!(h.store.deleted_ids().len(), 3);
        let mut coordinates: Vec<_> = h.store.list_all().into_iter().map(|r| r.coordinate).collect();
        coordinates.sort();
        assert_eq!(coordinates, vec![at(1), at(2), at(3)]);
    }

    #[tokio::test]
    async fn n_registrations_produce_n_flushed_dirty_shops() {
        let records: Vec<_> = (0..25).map(legacy).collect();
        let h = Harness::new(records);
        let migrator = h.migrator(h.mirrored_world());

        let report = migrator.spawn(false).join().await.unwrap();

        assert_eq!(report.commit.registered, 25);
        assert_eq!(report.commit.flush_requested, 25);
        assert_eq!(h.store.dirty_count(), 0);
        let ids: Vec<ShopId> = h.store.list_all().into_iter().map(|r| r.id).collect();
        assert_eq!(ids.len(), 25);
        assert!(ids.iter().all(|id| h.store.durable(*id).is_some()));
    }

    #[tokio::test]
    async fn commit_waits_for_the_barrier() {
        let h = Harness::new(vec![legacy(1), legacy(2)]);
        let scheduler = Arc::new(GatedScheduler::default());
        let migrator = h
            .builder(h.mirrored_world())
            .scheduler(scheduler.clone())
            .build()
            .unwrap();

        let run = migrator.spawn(false);
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }

        // Every item already ran inline, yet nothing may be committed.
        assert_eq!(run.state(), RunState::Extracting);
        assert!(!h.source.is_quiesced());
        assert!(h.relocator.moves().is_empty());
        assert!(h.store.is_empty());

        scheduler.release();
        let report = run.join().await.unwrap();

        assert_eq!(report.state, RunState::Done);
        assert!(h.source.is_quiesced());
        assert_eq!(h.store.len(), 2);
    }

    #[tokio::test]
    async fn broken_barrier_aborts_without_committing() {
        let h = Harness::new(vec![legacy(1)]);
        let scheduler = Arc::new(GatedScheduler::default());
        let migrator = h
            .builder(h.mirrored_world())
            .scheduler(scheduler.clone())
            .build()
            .unwrap();

        let run = migrator.spawn(false);
        scheduler.abandon();
        let report = run.join().await.unwrap();

        assert!(report.aborted);
        assert_eq!(report.state, RunState::DoneWithWarnings);
        assert_eq!(report.extraction.staged, 1);
        assert_eq!(report.commit.registered, 0);
        assert!(!h.source.is_quiesced());
        assert!(h.store.is_empty());
    }

    #[tokio::test]
    async fn flush_failure_keeps_shop_registered() {
        let h = Harness::new(vec![legacy(1), legacy(2)]);
        h.store.inject_flush_fault(at(2), FlushFault::Always);
        let migrator = h.migrator(h.mirrored_world());

        let report = migrator.spawn(false).join().await.unwrap();

        assert_eq!(report.state, RunState::DoneWithWarnings);
        assert_eq!(report.commit.flush_failed, 1);
        assert_eq!(h.store.len(), 2);
        assert!(h.store.lookup(&at(2)).unwrap().dirty);
    }

    #[tokio::test]
    async fn crashed_flush_wait_ends_run_with_warnings() {
        let h = Harness::new(vec![legacy(1)]);
        h.store.inject_flush_fault(at(1), FlushFault::Panic);
        let migrator = h.migrator(h.mirrored_world());

        let report = migrator.spawn(false).join().await.unwrap();

        assert!(report.commit.flush_wait_failed);
        assert_eq!(report.state, RunState::DoneWithWarnings);
        assert_eq!(h.store.len(), 1);
    }

    #[tokio::test]
    async fn progress_reports_every_stage() {
        let h = Harness::new(vec![legacy(1), legacy(2)]);
        let migrator = h.migrator(h.mirrored_world());

        migrator.spawn(false).join().await.unwrap();

        let events = h.progress.events();
        assert_eq!(events[0], ("start migrating shops".to_string(), 0, 2));
        let mut attempted: Vec<usize> = events
            .iter()
            .filter(|(m, _, _)| m.starts_with("migrating "))
            .map(|(_, current, _)| *current)
            .collect();
        attempted.sort();
        assert_eq!(attempted, vec![1, 2]);
        assert!(events.iter().any(|(m, _, _)| m == "unloading legacy shop system"));
        assert_eq!(
            events.iter().filter(|(m, _, _)| m.starts_with("registering ")).count(),
            2
        );
        assert_eq!(events.last().unwrap(), &("saving shops".to_string(), 0, 2));
    }

    #[tokio::test]
    async fn state_watch_ends_terminal() {
        let h = Harness::new(vec![legacy(1)]);
        let migrator = h.migrator(h.mirrored_world());

        let run = migrator.spawn(false);
        let mut states = run.subscribe();
        let report = run.join().await.unwrap();

        assert!(states.borrow_and_update().is_terminal());
        assert_eq!(*states.borrow(), report.state);
    }

    #[tokio::test]
    async fn migrate_returns_true_and_runs_detached() {
        let h = Harness::new(vec![legacy(1)]);
        let migrator = h.migrator(h.mirrored_world());

        assert!(migrator.migrate(false));

        for _ in 0..200 {
            if h.store.len() == 1 && h.store.dirty_count() == 0 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        assert_eq!(h.store.len(), 1);
        assert_eq!(h.source.quiesce_calls(), 1);
    }

    #[tokio::test]
    async fn report_uses_injected_clock() {
        use crate::ports::FixedClock;
        use chrono::TimeZone;

        let at_noon = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let h = Harness::new(vec![]);
        let migrator = h
            .builder(StaticWorld::new())
            .clock(Arc::new(FixedClock::new(at_noon)))
            .build()
            .unwrap();

        let report = migrator.spawn(false).join().await.unwrap();

        assert_eq!(report.started_at, at_noon);
        assert_eq!(report.finished_at, at_noon);
        assert_eq!(report.extraction.total, 0);
        assert_eq!(report.state, RunState::Done);
    }

    #[tokio::test]
    async fn records_added_after_spawn_are_not_migrated() {
        let h = Harness::new(vec![legacy(1)]);
        let migrator = h.migrator(StaticWorld::mirroring(&[legacy(1), legacy(2)]));

        let run = migrator.spawn(false);
        h.source.push(legacy(2));
        let report = run.join().await.unwrap();

        assert_eq!(report.extraction.total, 1);
        assert_eq!(report.commit.registered, 1);
        assert_eq!(h.store.len(), 1);
        assert!(h.store.lookup(&at(2)).is_none());
    }

    /// Crashes on one owner, resolves everyone else without a name.
    struct CrashingIdentities {
        crash_on: Uuid,
    }

    impl IdentityResolver for CrashingIdentities {
        fn resolve(&self, reference: Uuid) -> Result<OwnerIdentity, IdentityError> {
            if reference == self.crash_on {
                panic!("profile lookup crashed for {reference}");
            }
            Ok(OwnerIdentity::new(reference, None))
        }
    }

    #[tokio::test]
    async fn panicking_record_is_lost_without_unwinding_the_run() {
        let h = Harness::new(vec![legacy(1), legacy(2)]);
        let scheduler = Arc::new(GatedScheduler::default());
        let migrator = h
            .builder(h.mirrored_world())
            .identities(Arc::new(CrashingIdentities {
                crash_on: legacy(2).owner,
            }))
            .scheduler(scheduler.clone())
            .build()
            .unwrap();

        // Items run inline here, so a panic escaping the task would unwind
        // out of spawn itself.
        let run = migrator.spawn(false);
        scheduler.release();
        let report = run.join().await.unwrap();

        assert_eq!(report.extraction.staged, 1);
        assert_eq!(report.extraction.lost, 1);
        assert_eq!(report.state, RunState::DoneWithWarnings);
        assert_eq!(h.store.len(), 1);
        assert!(h.store.lookup(&at(2)).is_none());
    }
}
