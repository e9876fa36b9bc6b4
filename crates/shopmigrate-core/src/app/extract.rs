//! Per-record extraction step: validate -> resolve conflict -> transform.
//!
//! Runs on scheduler workers. Every failure here is per-record: it is logged
//! with the record's description and turned into a `RecordOutcome`, never
//! propagated.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::{debug, warn};

use super::{Transformer, Validator};
use crate::domain::{
    ConflictDecision, ConflictPolicy, ExtractionSummary, LegacyRecord, MigrationError,
    RecordOutcome, TargetRecord,
};
use crate::ports::TargetStore;

pub struct RecordPipeline {
    validator: Validator,
    policy: Arc<dyn ConflictPolicy>,
    transformer: Transformer,
    store: Arc<dyn TargetStore>,
    override_existing: bool,
}

impl RecordPipeline {
    pub fn new(
        validator: Validator,
        policy: Arc<dyn ConflictPolicy>,
        transformer: Transformer,
        store: Arc<dyn TargetStore>,
        override_existing: bool,
    ) -> Self {
        Self {
            validator,
            policy,
            transformer,
            store,
            override_existing,
        }
    }

    /// Process one legacy record. Returns the draft to stage, if any.
    pub fn process(&self, record: &LegacyRecord) -> (RecordOutcome, Option<TargetRecord>) {
        let container = match self.validator.validate(record) {
            Ok(container) => container,
            Err(e) => {
                warn!(coordinate = %record.coordinate, "shop invalid, skipped: {e}: {record}");
                return (RecordOutcome::Rejected(e.to_string()), None);
            }
        };

        // Conflict check and delete happen before the transformer runs.
        let existing = self.store.lookup(&record.coordinate);
        let overwritten = match self.policy.decide(existing.as_ref(), self.override_existing) {
            ConflictDecision::Proceed => false,
            ConflictDecision::Skip => {
                warn!(coordinate = %record.coordinate, "shop conflict: keeping existing shop, skipping {record}");
                return (RecordOutcome::Skipped, None);
            }
            ConflictDecision::Overwrite => {
                let Some(existing) = existing else {
                    return (RecordOutcome::Rejected("overwrite without an occupant".into()), None);
                };
                warn!(coordinate = %record.coordinate, shop_id = %existing.id, "shop conflict: overwriting existing shop");
                if let Err(e) = self.clear_occupant(&existing) {
                    warn!(coordinate = %record.coordinate, "failed to delete conflicting shop: {e}: {record}");
                    return (RecordOutcome::Rejected(e.to_string()), None);
                }
                true
            }
        };

        match self.transformer.transform(record, &container) {
            Ok(draft) => {
                debug!(coordinate = %record.coordinate, "shop staged");
                (RecordOutcome::Staged { overwritten }, Some(draft))
            }
            Err(e) => {
                warn!(coordinate = %record.coordinate, "failed to migrate shop {record}: {e}");
                (RecordOutcome::Rejected(e.to_string()), None)
            }
        }
    }

    fn clear_occupant(&self, existing: &TargetRecord) -> Result<(), MigrationError> {
        self.store.delete(existing)?;
        Ok(())
    }
}

/// Lock-free counters shared by all extraction tasks of one run.
#[derive(Debug, Default)]
pub struct ExtractionTally {
    attempted: AtomicUsize,
    staged: AtomicUsize,
    skipped: AtomicUsize,
    rejected: AtomicUsize,
    overwritten: AtomicUsize,
}

impl ExtractionTally {
    /// Count one more attempted record; returns the new count.
    pub fn begin(&self) -> usize {
        self.attempted.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn record(&self, outcome: &RecordOutcome) {
        match outcome {
            RecordOutcome::Staged { overwritten } => {
                self.staged.fetch_add(1, Ordering::SeqCst);
                if *overwritten {
                    self.overwritten.fetch_add(1, Ordering::SeqCst);
                }
            }
            RecordOutcome::Skipped => {
                self.skipped.fetch_add(1, Ordering::SeqCst);
            }
            RecordOutcome::Rejected(_) => {
                self.rejected.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    pub fn summary(&self, total: usize, lost: usize) -> ExtractionSummary {
        ExtractionSummary {
            total,
            attempted: self.attempted.load(Ordering::SeqCst),
            staged: self.staged.load(Ordering::SeqCst),
            skipped: self.skipped.load(Ordering::SeqCst),
            rejected: self.rejected.load(Ordering::SeqCst),
            overwritten: self.overwritten.load(Ordering::SeqCst),
            lost,
        }
    }
}
