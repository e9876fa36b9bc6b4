//! Conflict decision: what to do when a target shop already occupies the
//! coordinate a legacy shop wants to migrate into.

use serde::{Deserialize, Serialize};

use super::record::TargetRecord;

/// Per-record decision. Computed at transform time, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictDecision {
    /// Coordinate is free.
    Proceed,

    /// Coordinate is taken and the operator did not ask to override.
    Skip,

    /// Coordinate is taken; delete the occupant, then proceed.
    Overwrite,
}

/// Decides how to treat an occupied coordinate.
///
/// Policies are pure functions: given what the target store currently holds
/// and the run-wide override flag, they return a decision without side
/// effects. Executing it (the delete under `Overwrite`) is the caller's job.
pub trait ConflictPolicy: Send + Sync {
    fn decide(&self, existing: Option<&TargetRecord>, override_existing: bool) -> ConflictDecision;
}

/// The only policy the migrator ships with.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultConflictPolicy;

impl ConflictPolicy for DefaultConflictPolicy {
    fn decide(&self, existing: Option<&TargetRecord>, override_existing: bool) -> ConflictDecision {
        match (existing, override_existing) {
            (None, _) => ConflictDecision::Proceed,
            (Some(_), false) => ConflictDecision::Skip,
            (Some(_), true) => ConflictDecision::Overwrite,
        }
    }
}
