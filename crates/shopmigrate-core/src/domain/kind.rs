//! Shop kind and the legacy kind-code translation table.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::errors::MigrationError;

/// Raw kind code as stored by the legacy system.
///
/// Kept as a raw number on purpose: the legacy data may hold codes this
/// version does not know, and those must surface as errors at transform time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LegacyKindCode(pub u8);

impl LegacyKindCode {
    pub const SELLING: LegacyKindCode = LegacyKindCode(0);
    pub const BUYING: LegacyKindCode = LegacyKindCode(1);
    pub const BOTH: LegacyKindCode = LegacyKindCode(2);
}

impl fmt::Display for LegacyKindCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Trading direction of a target shop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShopKind {
    Selling,
    Buying,
    Both,
}

impl ShopKind {
    /// Target-side numeric id.
    pub fn id(self) -> u8 {
        match self {
            ShopKind::Selling => 0,
            ShopKind::Buying => 1,
            ShopKind::Both => 2,
        }
    }
}

impl TryFrom<LegacyKindCode> for ShopKind {
    type Error = MigrationError;

    fn try_from(code: LegacyKindCode) -> Result<Self, Self::Error> {
        match code {
            LegacyKindCode::SELLING => Ok(ShopKind::Selling),
            LegacyKindCode::BUYING => Ok(ShopKind::Buying),
            LegacyKindCode::BOTH => Ok(ShopKind::Both),
            other => Err(MigrationError::UnknownKind(other)),
        }
    }
}
