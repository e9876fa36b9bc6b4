//! Record transformer: legacy shop -> target draft.

use std::sync::Arc;

use crate::domain::{
    Benefit, Container, InventoryLink, LegacyRecord, MigrationError, ShopId, ShopKind,
    TargetRecord,
};
use crate::ports::IdentityResolver;

#[derive(Clone)]
pub struct Transformer {
    identities: Arc<dyn IdentityResolver>,
    origin: String,
}

impl Transformer {
    pub fn new(identities: Arc<dyn IdentityResolver>, origin: impl Into<String>) -> Self {
        Self {
            identities,
            origin: origin.into(),
        }
    }

    /// Build a draft for a validated record.
    ///
    /// Identity lookups block the calling thread.
    pub fn transform(
        &self,
        record: &LegacyRecord,
        container: &Container,
    ) -> Result<TargetRecord, MigrationError> {
        let kind = ShopKind::try_from(record.kind)?;
        let owner = self.identities.resolve(record.owner)?;
        let tax_account = record
            .tax_account
            .map(|uuid| self.identities.resolve(uuid))
            .transpose()?;

        Ok(TargetRecord {
            id: ShopId::UNASSIGNED,
            coordinate: record.coordinate.clone(),
            price: record.price,
            item: record.item.clone(),
            owner,
            unlimited: record.unlimited,
            kind,
            currency: record.currency.clone(),
            display_disabled: record.display_disabled,
            tax_account,
            inventory: InventoryLink::wrap(container),
            benefit: Benefit::default(),
            origin: self.origin.clone(),
            extra: serde_json::Map::new(),
            dirty: true,
        })
    }
}
