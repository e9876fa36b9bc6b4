//! Legacy and target shop records.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::container::InventoryLink;
use super::coordinate::Coordinate;
use super::ids::ShopId;
use super::kind::{LegacyKindCode, ShopKind};

/// The traded item, as both systems describe it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDescriptor {
    pub material: String,

    #[serde(default = "default_amount")]
    pub amount: u32,

    /// Opaque item metadata (enchantments, display name, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}

fn default_amount() -> u32 {
    1
}

impl ItemDescriptor {
    pub fn new(material: impl Into<String>, amount: u32) -> Self {
        Self {
            material: material.into(),
            amount,
            meta: None,
        }
    }
}

impl fmt::Display for ItemDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.material, self.amount)
    }
}

/// A shop in the legacy representation. Read-only to the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyRecord {
    pub coordinate: Coordinate,
    pub price: f64,
    pub item: ItemDescriptor,
    pub owner: Uuid,

    #[serde(default)]
    pub unlimited: bool,

    pub kind: LegacyKindCode,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,

    #[serde(default)]
    pub display_disabled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_account: Option<Uuid>,

    /// Block kind the legacy system recorded for the shop's container.
    pub container: String,
}

impl fmt::Display for LegacyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LegacyShop{{at={}, owner={}, item={}, price={}, kind={}}}",
            self.coordinate, self.owner, self.item, self.price, self.kind
        )
    }
}

/// A resolved player or account identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerIdentity {
    pub uuid: Uuid,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl OwnerIdentity {
    pub fn new(uuid: Uuid, name: Option<String>) -> Self {
        Self { uuid, name }
    }
}

impl fmt::Display for OwnerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{name}({})", self.uuid),
            None => self.uuid.fmt(f),
        }
    }
}

/// Economic-benefit accumulator: share of each sale paid to a beneficiary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Benefit {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub shares: BTreeMap<Uuid, f64>,
}

impl Benefit {
    pub fn is_empty(&self) -> bool {
        self.shares.is_empty()
    }
}

/// A shop in the target representation.
///
/// Drafts are built by the transformer with `ShopId::UNASSIGNED`; the target
/// store assigns the id on registration and owns the record afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetRecord {
    pub id: ShopId,
    pub coordinate: Coordinate,
    pub price: f64,
    pub item: ItemDescriptor,
    pub owner: OwnerIdentity,
    pub unlimited: bool,
    pub kind: ShopKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,

    pub display_disabled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_account: Option<OwnerIdentity>,

    pub inventory: InventoryLink,

    #[serde(default)]
    pub benefit: Benefit,

    /// Which subsystem created the record.
    pub origin: String,

    /// Free-form per-shop extra data; empty for migrated shops.
    #[serde(default)]
    pub extra: serde_json::Map<String, serde_json::Value>,

    /// Unsaved changes relative to durable storage.
    #[serde(default)]
    pub dirty: bool,
}

impl TargetRecord {
    pub fn is_draft(&self) -> bool {
        !self.id.is_assigned()
    }

    pub fn set_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    /// Copy of this draft carrying a store-assigned identity.
    pub fn with_id(mut self, id: ShopId) -> Self {
        self.id = id;
        self
    }
}

impl fmt::Display for TargetRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Shop{{{}, at={}, owner={}, item={}, price={}, kind={:?}}}",
            self.id, self.coordinate, self.owner, self.item, self.price, self.kind
        )
    }
}
