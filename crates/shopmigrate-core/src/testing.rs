//! Test fixtures and recording fakes shared by unit tests.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    Benefit, Container, Coordinate, InventoryLink, ItemDescriptor, LegacyKindCode, LegacyRecord,
    OwnerIdentity, RelocationError, ShopId, ShopKind, TargetRecord,
};
use crate::ports::{
    BatchCompletion, BatchScheduler, CompletionSignal, DataRelocator, ItemFn, ProgressReporter,
};

pub(crate) fn at(x: i32) -> Coordinate {
    Coordinate::new("world", x, 64, 0)
}

pub(crate) fn legacy(x: i32) -> LegacyRecord {
    LegacyRecord {
        coordinate: at(x),
        price: 10.0 + x as f64,
        item: ItemDescriptor::new("DIAMOND", 1),
        owner: Uuid::from_u128(x as u128 + 1),
        unlimited: false,
        kind: LegacyKindCode::SELLING,
        currency: None,
        display_disabled: false,
        tax_account: None,
        container: "CHEST".to_string(),
    }
}

pub(crate) fn draft(x: i32) -> TargetRecord {
    TargetRecord {
        id: ShopId::UNASSIGNED,
        coordinate: at(x),
        price: 1.0,
        item: ItemDescriptor::new("EMERALD", 1),
        owner: OwnerIdentity::new(Uuid::nil(), None),
        unlimited: false,
        kind: ShopKind::Selling,
        currency: None,
        display_disabled: false,
        tax_account: None,
        inventory: InventoryLink::wrap(&Container::new("CHEST", at(x).to_string())),
        benefit: Benefit::default(),
        origin: "existing".to_string(),
        extra: Default::default(),
        dirty: false,
    }
}

/// Keeps every progress message.
#[derive(Default)]
pub(crate) struct RecordingProgress {
    events: Mutex<Vec<(String, usize, usize)>>,
}

impl RecordingProgress {
    pub(crate) fn events(&self) -> Vec<(String, usize, usize)> {
        self.events.lock().unwrap().clone()
    }
}

impl ProgressReporter for RecordingProgress {
    fn report(&self, message: &str, current: usize, total: usize) {
        self.events
            .lock()
            .unwrap()
            .push((message.to_string(), current, total));
    }
}

/// Runs every item inline on submit, but only fires the completion when the
/// test calls `release`.
#[derive(Default)]
pub(crate) struct GatedScheduler {
    pending: Mutex<Option<(CompletionSignal, usize)>>,
}

impl GatedScheduler {
    pub(crate) fn release(&self) {
        if let Some((signal, n)) = self.pending.lock().unwrap().take() {
            signal.fire(crate::ports::BatchSummary {
                submitted: n,
                completed: n,
                panicked: 0,
            });
        }
    }

    /// Drop the completion signal without firing it.
    pub(crate) fn abandon(&self) {
        self.pending.lock().unwrap().take();
    }
}

impl<T: Send + 'static> BatchScheduler<T> for GatedScheduler {
    fn submit(&self, items: Vec<T>, per_item: ItemFn<T>) -> BatchCompletion {
        let n = items.len();
        for item in items {
            per_item(item);
        }
        let (signal, completion) = BatchCompletion::channel();
        *self.pending.lock().unwrap() = Some((signal, n));
        completion
    }
}

/// Records every move; fails all of them when `fail` is set.
#[derive(Default)]
pub(crate) struct RecordingRelocator {
    pub(crate) fail: bool,
    moves: Mutex<Vec<(PathBuf, PathBuf)>>,
}

impl RecordingRelocator {
    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub(crate) fn moves(&self) -> Vec<(PathBuf, PathBuf)> {
        self.moves.lock().unwrap().clone()
    }
}

#[async_trait]
impl DataRelocator for RecordingRelocator {
    async fn move_directory(&self, from: &Path, to: &Path) -> Result<(), RelocationError> {
        self.moves
            .lock()
            .unwrap()
            .push((from.to_path_buf(), to.to_path_buf()));
        if self.fail {
            return Err(RelocationError::SourceMissing(from.to_path_buf()));
        }
        Ok(())
    }
}
