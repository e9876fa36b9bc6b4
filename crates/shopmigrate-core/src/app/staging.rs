//! Staging list: fan-in point for drafts produced by extraction workers.
//!
//! Append-only while extraction runs, then sealed exactly once. Sealing hands
//! the drafts out as `StagedDrafts`, which can only be read; anything pushed
//! after the seal is refused.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::warn;

use crate::domain::TargetRecord;

#[derive(Default)]
struct StagingState {
    drafts: Vec<TargetRecord>,
    sealed: bool,
}

#[derive(Default)]
pub struct StagingList {
    state: Mutex<StagingState>,
}

impl StagingList {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, StagingState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a draft. Returns `false` if the list is already sealed.
    pub fn push(&self, draft: TargetRecord) -> bool {
        let mut state = self.lock();
        if state.sealed {
            warn!(coordinate = %draft.coordinate, "draft arrived after staging was sealed, dropped");
            return false;
        }
        state.drafts.push(draft);
        true
    }

    pub fn len(&self) -> usize {
        self.lock().drafts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// End the append phase and take the drafts.
    pub fn seal(&self) -> StagedDrafts {
        let mut state = self.lock();
        state.sealed = true;
        StagedDrafts(std::mem::take(&mut state.drafts))
    }
}

/// Read-only drafts handed to the commit phase.
#[derive(Debug, Default)]
pub struct StagedDrafts(Vec<TargetRecord>);

impl StagedDrafts {
    pub fn iter(&self) -> std::slice::Iter<'_, TargetRecord> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a StagedDrafts {
    type Item = &'a TargetRecord;
    type IntoIter = std::slice::Iter<'a, TargetRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
