use serde::{Deserialize, Serialize};
use std::fmt;

/// A container-capable block resolved in the live world.
///
/// `inventory_key` is the capability to reach the container's contents. It is
/// not ownership of the block itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    pub block: String,
    pub inventory_key: String,
}

impl Container {
    pub fn new(block: impl Into<String>, inventory_key: impl Into<String>) -> Self {
        Self {
            block: block.into(),
            inventory_key: inventory_key.into(),
        }
    }
}

/// Handle a target record keeps into a container's contents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InventoryLink(String);

impl InventoryLink {
    const WRAPPER: &'static str = "container";

    /// Wrap a validated container's content capability.
    pub fn wrap(container: &Container) -> Self {
        Self(format!(
            "{}:{}:{}",
            Self::WRAPPER,
            container.block,
            container.inventory_key
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InventoryLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
