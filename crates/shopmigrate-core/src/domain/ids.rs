//! Domain identifiers (strongly-typed IDs).
//!
//! - `ShopId` is assigned by the target store at registration time. Drafts carry
//!   the `UNASSIGNED` sentinel until then; the pipeline never invents one.
//! - `RunId` names one migration run. ULID based, so run ids sort by start time
//!   and show up in logs in the order runs were started.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Store-assigned numeric identity of a target record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ShopId(i64);

impl ShopId {
    /// Sentinel carried by drafts that have not been registered yet.
    pub const UNASSIGNED: ShopId = ShopId(-1);

    pub fn new(raw: i64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> i64 {
        self.0
    }

    pub fn is_assigned(self) -> bool {
        self != Self::UNASSIGNED
    }
}

impl fmt::Display for ShopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_assigned() {
            write!(f, "shop-{}", self.0)
        } else {
            f.write_str("shop-unassigned")
        }
    }
}

/// Identifier of one migration run. Logs and the run report both show the
/// bare ULID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RunId(Ulid);

impl RunId {
    /// Run id whose timestamp part is `at`, so a fixed clock gives ids that
    /// sort by start time.
    pub fn at(at: DateTime<Utc>) -> Self {
        let timestamp_ms = at.timestamp_millis().max(0) as u64;
        Self(Ulid::from_parts(timestamp_ms, rand::random()))
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
