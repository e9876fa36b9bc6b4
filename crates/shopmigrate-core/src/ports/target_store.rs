//! TargetStore port - the store shops are migrated into.
//!
//! The store is live: other parts of the application register, edit and delete
//! shops while a migration runs. The store owns coordinate uniqueness and
//! identity assignment; the pipeline only asks.

use async_trait::async_trait;

use crate::domain::{Coordinate, ShopId, StoreError, TargetRecord};

#[async_trait]
pub trait TargetStore: Send + Sync {
    /// The shop currently at `coordinate`, if any.
    fn lookup(&self, coordinate: &Coordinate) -> Option<TargetRecord>;

    /// Remove a registered shop.
    fn delete(&self, record: &TargetRecord) -> Result<(), StoreError>;

    /// Register a draft. The store assigns the identity and refuses a draft
    /// whose coordinate is already occupied.
    fn register(&self, draft: TargetRecord) -> Result<TargetRecord, StoreError>;

    /// Flag a registered shop as having unsaved changes.
    fn mark_dirty(&self, id: ShopId) -> Result<(), StoreError>;

    /// Snapshot of every registered shop.
    fn list_all(&self) -> Vec<TargetRecord>;

    /// Persist one shop. Success clears its dirty flag; failure leaves it dirty
    /// for the store's own later flush cycles.
    async fn flush(&self, record: &TargetRecord) -> Result<(), StoreError>;
}
