//! Domain model (coordinates, records, kinds, decisions, outcomes, errors).
//!
//! Nothing here talks to a collaborator; every type is plain data or a pure
//! function over plain data.

pub mod container;
pub mod coordinate;
pub mod decision;
pub mod errors;
pub mod ids;
pub mod kind;
pub mod outcome;
pub mod record;
pub mod state;

pub use container::{Container, InventoryLink};
pub use coordinate::Coordinate;
pub use decision::{ConflictDecision, ConflictPolicy, DefaultConflictPolicy};
pub use errors::{IdentityError, MigrationError, RelocationError, StoreError};
pub use ids::{RunId, ShopId};
pub use kind::{LegacyKindCode, ShopKind};
pub use outcome::{CommitReport, ExtractionSummary, RecordOutcome, RunReport};
pub use record::{Benefit, ItemDescriptor, LegacyRecord, OwnerIdentity, TargetRecord};
pub use state::RunState;
