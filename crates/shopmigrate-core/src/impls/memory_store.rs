//! In-memory target store.
//!
//! Holds registered shops, a coordinate index, and a "durable" copy written on
//! flush. Flushes retry with exponential backoff per `RetryPolicy`; tests can
//! inject flush faults per coordinate.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tracing::{debug, warn};

use super::RetryPolicy;
use crate::domain::{Coordinate, ShopId, StoreError, TargetRecord};
use crate::ports::TargetStore;

/// Fault injected into flushes of the shop at a coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushFault {
    /// Every attempt fails.
    Always,

    /// The next `n` attempts fail, later ones succeed.
    Times(u32),

    /// The flush panics (models a broken persistence worker).
    Panic,
}

struct InMemoryStoreState {
    /// All registered shops (single source of truth).
    records: HashMap<ShopId, TargetRecord>,

    /// Coordinate index. Holds ShopIds only.
    by_coordinate: HashMap<Coordinate, ShopId>,

    /// Last successfully flushed copy of each shop.
    durable: HashMap<ShopId, TargetRecord>,

    /// Ids removed through `delete`, in call order.
    deleted: Vec<ShopId>,

    faults: HashMap<Coordinate, FlushFault>,

    /// Flush attempts, including retries.
    flush_attempts: usize,

    next_id: i64,
}

impl InMemoryStoreState {
    fn new() -> Self {
        Self {
            records: HashMap::new(),
            by_coordinate: HashMap::new(),
            durable: HashMap::new(),
            deleted: Vec::new(),
            faults: HashMap::new(),
            flush_attempts: 0,
            next_id: 1,
        }
    }

    fn allocate_id(&mut self) -> ShopId {
        let id = ShopId::new(self.next_id);
        self.next_id += 1;
        id
    }

    /// Consume one injected fault for `coordinate`, if any.
    fn take_fault(&mut self, coordinate: &Coordinate) -> Option<FlushFault> {
        let fault = self.faults.get(coordinate).copied()?;
        match fault {
            FlushFault::Times(n) if n <= 1 => {
                self.faults.remove(coordinate);
            }
            FlushFault::Times(n) => {
                self.faults.insert(coordinate.clone(), FlushFault::Times(n - 1));
            }
            FlushFault::Always | FlushFault::Panic => {}
        }
        Some(fault)
    }
}

enum AttemptResult {
    Flushed,
    Failed(StoreError),
    Panic,
}

/// In-memory `TargetStore`.
pub struct InMemoryTargetStore {
    state: Arc<Mutex<InMemoryStoreState>>,
    retry_policy: RetryPolicy,
}

impl InMemoryTargetStore {
    pub fn new(retry_policy: RetryPolicy) -> Self {
        Self {
            state: Arc::new(Mutex::new(InMemoryStoreState::new())),
            retry_policy,
        }
    }

    // A panic while holding the lock must not wedge every later call.
    fn lock(&self) -> MutexGuard<'_, InMemoryStoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Inject a flush fault for the shop at `coordinate`.
    pub fn inject_flush_fault(&self, coordinate: Coordinate, fault: FlushFault) {
        self.lock().faults.insert(coordinate, fault);
    }

    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, id: ShopId) -> Option<TargetRecord> {
        self.lock().records.get(&id).cloned()
    }

    /// Durable copy written by the last successful flush.
    pub fn durable(&self, id: ShopId) -> Option<TargetRecord> {
        self.lock().durable.get(&id).cloned()
    }

    pub fn dirty_count(&self) -> usize {
        self.lock().records.values().filter(|r| r.dirty).count()
    }

    pub fn deleted_ids(&self) -> Vec<ShopId> {
        self.lock().deleted.clone()
    }

    pub fn flush_attempts(&self) -> usize {
        self.lock().flush_attempts
    }

    fn attempt_flush(&self, record: &TargetRecord) -> AttemptResult {
        let mut state = self.lock();
        state.flush_attempts += 1;

        match state.take_fault(&record.coordinate) {
            Some(FlushFault::Panic) => return AttemptResult::Panic,
            Some(FlushFault::Always) | Some(FlushFault::Times(_)) => {
                return AttemptResult::Failed(StoreError::FlushFailed {
                    id: record.id,
                    reason: "injected fault".to_string(),
                });
            }
            None => {}
        }

        let Some(current) = state.records.get_mut(&record.id) else {
            return AttemptResult::Failed(StoreError::NotFound(record.id));
        };
        current.clear_dirty();
        let snapshot = current.clone();
        state.durable.insert(record.id, snapshot);
        AttemptResult::Flushed
    }
}

impl Default for InMemoryTargetStore {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}

#[async_trait]
impl TargetStore for InMemoryTargetStore {
    fn lookup(&self, coordinate: &Coordinate) -> Option<TargetRecord> {
        let state = self.lock();
        let id = state.by_coordinate.get(coordinate)?;
        state.records.get(id).cloned()
    }

    fn delete(&self, record: &TargetRecord) -> Result<(), StoreError> {
        let mut state = self.lock();
        let removed = state
            .records
            .remove(&record.id)
            .ok_or(StoreError::NotFound(record.id))?;
        state.by_coordinate.remove(&removed.coordinate);
        state.durable.remove(&record.id);
        state.deleted.push(record.id);
        Ok(())
    }

    fn register(&self, draft: TargetRecord) -> Result<TargetRecord, StoreError> {
        if !draft.is_draft() {
            return Err(StoreError::AlreadyRegistered(draft.id));
        }
        let mut state = self.lock();
        if state.by_coordinate.contains_key(&draft.coordinate) {
            return Err(StoreError::Occupied(draft.coordinate));
        }
        let id = state.allocate_id();
        let record = draft.with_id(id);
        state.by_coordinate.insert(record.coordinate.clone(), id);
        state.records.insert(id, record.clone());
        Ok(record)
    }

    fn mark_dirty(&self, id: ShopId) -> Result<(), StoreError> {
        let mut state = self.lock();
        let record = state.records.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        record.set_dirty();
        Ok(())
    }

    fn list_all(&self) -> Vec<TargetRecord> {
        let mut all: Vec<TargetRecord> = self.lock().records.values().cloned().collect();
        all.sort_by_key(|r| r.id);
        all
    }

    async fn flush(&self, record: &TargetRecord) -> Result<(), StoreError> {
        let mut attempts = 0;
        loop {
            attempts += 1;
            // Lock is released inside attempt_flush; never held across await.
            let error = match self.attempt_flush(record) {
                AttemptResult::Flushed => return Ok(()),
                AttemptResult::Panic => panic!("persistence worker crashed flushing {}", record.id),
                AttemptResult::Failed(error) => error,
            };

            if matches!(error, StoreError::NotFound(_)) || !self.retry_policy.should_retry(attempts) {
                warn!(shop_id = %record.id, attempts, %error, "flush gave up");
                return Err(error);
            }

            let delay = self.retry_policy.next_delay(attempts);
            debug!(shop_id = %record.id, attempts, ?delay, %error, "flush failed, retrying");
            tokio::time::sleep(delay).await;
        }
    }
}
