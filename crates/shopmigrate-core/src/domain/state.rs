//! Run state machine.

use serde::{Deserialize, Serialize};

/// Where a migration run is.
///
/// State transitions:
/// - NotStarted -> Extracting -> Barrier -> Committing -> Flushing -> Done
/// - any per-record failure during Extracting, or a non-fatal failure during
///   Committing/Flushing, ends the run in DoneWithWarnings instead of Done
/// - a catastrophic flush-wait failure jumps from Flushing to DoneWithWarnings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunState {
    NotStarted,
    Extracting,
    Barrier,
    Committing,
    Flushing,
    Done,
    DoneWithWarnings,
}

impl RunState {
    /// Is this a terminal state (no further transitions)?
    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Done | RunState::DoneWithWarnings)
    }
}
