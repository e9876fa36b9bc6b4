//! App - the migration pipeline assembled from ports.
//!
//! # Components
//! - **Validator / Transformer**: per-record checks and conversion
//! - **RecordPipeline**: validate -> conflict policy -> transform, per record
//! - **StagingList**: fan-in of drafts until the barrier
//! - **CommitPhase**: quiesce, relocate, register, flush
//! - **Migrator**: drives a run; `MigratorBuilder` wires it
//! - **ComponentRegistry**: priority-ordered migration components

pub mod builder;
pub mod commit;
pub mod extract;
pub mod orchestrator;
pub mod registry;
pub mod staging;
pub mod transformer;
pub mod validator;

pub use self::builder::{BuildError, MigratorBuilder};
pub use self::commit::{CommitPhase, RelocationPlan};
pub use self::extract::{ExtractionTally, RecordPipeline};
pub use self::orchestrator::{MigrationRun, Migrator};
pub use self::registry::{ComponentRegistry, MigrateComponent, RegistryError};
pub use self::staging::{StagedDrafts, StagingList};
pub use self::transformer::Transformer;
pub use self::validator::Validator;
