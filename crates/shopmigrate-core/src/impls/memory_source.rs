//! In-memory legacy system: shop list plus an enable/disable switch.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::info;

use crate::domain::LegacyRecord;
use crate::ports::{LegacySource, SourceLifecycle};

pub struct InMemoryLegacySource {
    records: Mutex<Vec<LegacyRecord>>,
    quiesced: AtomicBool,
    quiesce_calls: AtomicUsize,
}

impl InMemoryLegacySource {
    pub fn new(records: Vec<LegacyRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            quiesced: AtomicBool::new(false),
            quiesce_calls: AtomicUsize::new(0),
        }
    }

    /// Parse a JSON array of legacy shops.
    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        let records: Vec<LegacyRecord> = serde_json::from_str(s)?;
        Ok(Self::new(records))
    }

    fn lock(&self) -> MutexGuard<'_, Vec<LegacyRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a shop, as the running legacy system would. Refused once quiesced.
    pub fn push(&self, record: LegacyRecord) -> bool {
        if self.is_quiesced() {
            return false;
        }
        self.lock().push(record);
        true
    }

    pub fn is_quiesced(&self) -> bool {
        self.quiesced.load(Ordering::SeqCst)
    }

    pub fn quiesce_calls(&self) -> usize {
        self.quiesce_calls.load(Ordering::SeqCst)
    }
}

impl LegacySource for InMemoryLegacySource {
    fn list_all(&self) -> Vec<LegacyRecord> {
        self.lock().clone()
    }
}

impl SourceLifecycle for InMemoryLegacySource {
    fn quiesce(&self) {
        self.quiesce_calls.fetch_add(1, Ordering::SeqCst);
        if !self.quiesced.swap(true, Ordering::SeqCst) {
            info!("legacy source disabled");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Coordinate, ItemDescriptor, LegacyKindCode};
    use uuid::Uuid;

    fn record(x: i32) -> LegacyRecord {
        LegacyRecord {
            coordinate: Coordinate::new("world", x, 64, 0),
            price: 1.0,
            item: ItemDescriptor::new("STONE", 1),
            owner: Uuid::nil(),
            unlimited: false,
            kind: LegacyKindCode::SELLING,
            currency: None,
            display_disabled: false,
            tax_account: None,
            container: "CHEST".to_string(),
        }
    }

    #[test]
    fn list_all_is_a_snapshot() {
        let source = InMemoryLegacySource::new(vec![record(1)]);
        let snapshot = source.list_all();
        assert!(source.push(record(2)));
        assert_eq!(snapshot.len(), 1);
        assert_eq!(source.list_all().len(), 2);
    }

    #[test]
    fn quiesce_is_idempotent_and_blocks_mutation() {
        let source = InMemoryLegacySource::new(vec![]);
        source.quiesce();
        source.quiesce();
        assert!(source.is_quiesced());
        assert_eq!(source.quiesce_calls(), 2);
        assert!(!source.push(record(1)));
        assert!(source.list_all().is_empty());
    }

    #[test]
    fn parses_json_array() {
        let json = r#"[{
            "coordinate": {"world": "world", "x": 1, "y": 2, "z": 3},
            "price": 5.0,
            "item": {"material": "APPLE", "amount": 3},
            "owner": "00000000-0000-0000-0000-000000000000",
            "kind": 2,
            "container": "BARREL"
        }]"#;
        let source = InMemoryLegacySource::from_json_str(json).unwrap();
        let all = source.list_all();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].kind, LegacyKindCode::BOTH);
    }
}
