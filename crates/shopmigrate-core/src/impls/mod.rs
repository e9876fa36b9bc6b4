//! Impls - port implementations.
//!
//! - **InMemoryTargetStore**: target store with flush retry and fault injection
//! - **InMemoryLegacySource**: legacy shop list plus quiesce switch
//! - **StaticWorld / StaticIdentities**: map-backed lookups
//! - **TokioBatchScheduler**: bounded blocking-pool scheduler
//! - **FsRelocator**: directory rename
//! - **TracingProgress**: progress through `tracing`

pub mod fs_relocator;
pub mod memory_source;
pub mod memory_store;
pub mod resolvers;
pub mod retry;
pub mod tokio_scheduler;
pub mod tracing_progress;

pub use self::fs_relocator::FsRelocator;
pub use self::memory_source::InMemoryLegacySource;
pub use self::memory_store::{FlushFault, InMemoryTargetStore};
pub use self::resolvers::{StaticIdentities, StaticWorld};
pub use self::retry::RetryPolicy;
pub use self::tokio_scheduler::TokioBatchScheduler;
pub use self::tracing_progress::TracingProgress;
