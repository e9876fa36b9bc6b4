//! Ports - collaborator contracts.
//!
//! Each trait is the seam to something outside the pipeline: the legacy
//! system, the target store, the world, the operator. The pipeline only ever
//! holds `Arc<dyn Port>` values handed to it at construction; swap in the
//! `impls` fakes to test it.

pub mod clock;
pub mod container;
pub mod identity;
pub mod legacy_source;
pub mod lifecycle;
pub mod progress;
pub mod relocation;
pub mod scheduler;
pub mod target_store;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::container::ContainerResolver;
pub use self::identity::IdentityResolver;
pub use self::legacy_source::LegacySource;
pub use self::lifecycle::SourceLifecycle;
pub use self::progress::{NoopProgress, ProgressReporter};
pub use self::relocation::DataRelocator;
pub use self::scheduler::{BatchCompletion, BatchScheduler, BatchSummary, CompletionSignal, ItemFn};
pub use self::target_store::TargetStore;
