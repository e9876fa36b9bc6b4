//! Outcome model: per-record results and the run report.
//!
//! The caller of `migrate` only ever sees `true`. Everything a run did that an
//! operator might care about ends up here (and in the logs).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::RunId;
use super::state::RunState;

/// Result of one extraction task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordOutcome {
    /// Draft appended to the staging list. `overwritten` is set when an
    /// existing target shop was deleted to make room.
    Staged { overwritten: bool },

    /// Coordinate occupied and override was off.
    Skipped,

    /// Validator or transformer refused the record.
    Rejected(String),
}

/// Counters gathered while extraction tasks run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionSummary {
    pub total: usize,
    pub attempted: usize,
    pub staged: usize,
    pub skipped: usize,
    pub rejected: usize,
    pub overwritten: usize,

    /// Tasks that died without reporting an outcome (panicked).
    pub lost: usize,
}

impl ExtractionSummary {
    pub fn has_warnings(&self) -> bool {
        self.skipped > 0 || self.rejected > 0 || self.lost > 0
    }
}

/// What the commit phase did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitReport {
    pub relocation_failed: bool,
    pub registered: usize,
    pub register_failed: usize,
    pub flush_requested: usize,
    pub flush_failed: usize,

    /// The aggregate flush wait itself broke; some flush results are unknown.
    pub flush_wait_failed: bool,
}

impl CommitReport {
    pub fn has_warnings(&self) -> bool {
        self.relocation_failed
            || self.register_failed > 0
            || self.flush_failed > 0
            || self.flush_wait_failed
    }
}

/// Summary of one migration run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: RunId,
    pub override_existing: bool,
    pub state: RunState,
    pub extraction: ExtractionSummary,
    pub commit: CommitReport,

    /// Barrier broke before the commit phase could start.
    #[serde(default)]
    pub aborted: bool,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    pub fn has_warnings(&self) -> bool {
        self.aborted || self.extraction.has_warnings() || self.commit.has_warnings()
    }

    /// Terminal state implied by the counters.
    pub fn final_state(&self) -> RunState {
        if self.has_warnings() {
            RunState::DoneWithWarnings
        } else {
            RunState::Done
        }
    }
}
