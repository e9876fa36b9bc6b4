//! Static world and identity lookups, backed by maps.

use std::collections::HashMap;

use uuid::Uuid;

use crate::domain::{Container, Coordinate, IdentityError, LegacyRecord, OwnerIdentity};
use crate::ports::{ContainerResolver, IdentityResolver};

/// Block kinds that can hold items.
const CONTAINER_BLOCKS: &[&str] = &[
    "CHEST",
    "TRAPPED_CHEST",
    "BARREL",
    "HOPPER",
    "DISPENSER",
    "DROPPER",
];

fn is_container_block(block: &str) -> bool {
    CONTAINER_BLOCKS.contains(&block) || block.ends_with("SHULKER_BOX")
}

/// A world snapshot: block kind per coordinate.
#[derive(Debug, Clone, Default)]
pub struct StaticWorld {
    blocks: HashMap<Coordinate, String>,
}

impl StaticWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// World where every legacy shop's recorded container is still standing.
    pub fn mirroring(records: &[LegacyRecord]) -> Self {
        let mut world = Self::new();
        for record in records {
            world.set_block(record.coordinate.clone(), record.container.clone());
        }
        world
    }

    pub fn set_block(&mut self, coordinate: Coordinate, block: impl Into<String>) {
        self.blocks.insert(coordinate, block.into());
    }

    pub fn with_block(mut self, coordinate: Coordinate, block: impl Into<String>) -> Self {
        self.set_block(coordinate, block);
        self
    }
}

impl ContainerResolver for StaticWorld {
    fn resolve(&self, coordinate: &Coordinate) -> Option<Container> {
        let block = self.blocks.get(coordinate)?;
        is_container_block(block).then(|| Container::new(block.clone(), coordinate.to_string()))
    }
}

/// Known player names keyed by UUID.
///
/// In lenient mode an unknown UUID resolves to a nameless identity, the way a
/// cold name cache would. In strict mode it is an error.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentities {
    names: HashMap<Uuid, String>,
    strict: bool,
}

impl StaticIdentities {
    pub fn lenient() -> Self {
        Self::default()
    }

    pub fn strict() -> Self {
        Self {
            names: HashMap::new(),
            strict: true,
        }
    }

    pub fn with_name(mut self, uuid: Uuid, name: impl Into<String>) -> Self {
        self.names.insert(uuid, name.into());
        self
    }
}

impl IdentityResolver for StaticIdentities {
    fn resolve(&self, reference: Uuid) -> Result<OwnerIdentity, IdentityError> {
        match self.names.get(&reference) {
            Some(name) => Ok(OwnerIdentity::new(reference, Some(name.clone()))),
            None if self.strict => Err(IdentityError::Unknown(reference)),
            None => Ok(OwnerIdentity::new(reference, None)),
        }
    }
}
