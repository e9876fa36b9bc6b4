//! MigratorBuilder - wiring for a `Migrator`.
//!
//! Collaborators without a sensible default must be provided; `build` fails
//! fast and names every missing one at once.

use std::sync::Arc;

use super::{CommitPhase, Migrator, RelocationPlan, Transformer, Validator};
use crate::config::{ConfigError, MigrationConfig};
use crate::domain::{ConflictPolicy, DefaultConflictPolicy, LegacyRecord};
use crate::impls::TokioBatchScheduler;
use crate::ports::{
    BatchScheduler, Clock, ContainerResolver, DataRelocator, IdentityResolver, LegacySource,
    NoopProgress, ProgressReporter, SourceLifecycle, SystemClock, TargetStore,
};

pub const DEFAULT_COMPONENT_NAME: &str = "quickshop";
pub const DEFAULT_OWNER: &str = "shopmigrate";

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("missing collaborators: {0:?}")]
    MissingCollaborators(Vec<&'static str>),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Builds a `Migrator`.
///
/// # Example
/// ```ignore
/// let migrator = MigratorBuilder::new()
///     .config(config)
///     .legacy(source)
///     .store(store)
///     .containers(world)
///     .identities(identities)
///     .relocator(Arc::new(FsRelocator))
///     .build()?;
/// ```
///
/// Defaults: `DefaultConflictPolicy`, `NoopProgress`, `SystemClock`, and a
/// `TokioBatchScheduler` sized by `config.max_parallel`.
pub struct MigratorBuilder {
    name: String,
    owner: String,
    priority: i32,
    config: MigrationConfig,
    source: Option<Arc<dyn LegacySource>>,
    lifecycle: Option<Arc<dyn SourceLifecycle>>,
    store: Option<Arc<dyn TargetStore>>,
    scheduler: Option<Arc<dyn BatchScheduler<LegacyRecord>>>,
    containers: Option<Arc<dyn ContainerResolver>>,
    identities: Option<Arc<dyn IdentityResolver>>,
    relocator: Option<Arc<dyn DataRelocator>>,
    policy: Arc<dyn ConflictPolicy>,
    progress: Arc<dyn ProgressReporter>,
    clock: Arc<dyn Clock>,
}

impl MigratorBuilder {
    pub fn new() -> Self {
        Self {
            name: DEFAULT_COMPONENT_NAME.to_string(),
            owner: DEFAULT_OWNER.to_string(),
            priority: 0,
            config: MigrationConfig::default(),
            source: None,
            lifecycle: None,
            store: None,
            scheduler: None,
            containers: None,
            identities: None,
            relocator: None,
            policy: Arc::new(DefaultConflictPolicy),
            progress: Arc::new(NoopProgress),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = owner.into();
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn config(mut self, config: MigrationConfig) -> Self {
        self.config = config;
        self
    }

    /// Use one value as both the record source and the lifecycle to quiesce.
    pub fn legacy<S>(mut self, legacy: Arc<S>) -> Self
    where
        S: LegacySource + SourceLifecycle + 'static,
    {
        self.source = Some(legacy.clone() as Arc<dyn LegacySource>);
        self.lifecycle = Some(legacy as Arc<dyn SourceLifecycle>);
        self
    }

    pub fn source(mut self, source: Arc<dyn LegacySource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn lifecycle(mut self, lifecycle: Arc<dyn SourceLifecycle>) -> Self {
        self.lifecycle = Some(lifecycle);
        self
    }

    pub fn store(mut self, store: Arc<dyn TargetStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn scheduler(mut self, scheduler: Arc<dyn BatchScheduler<LegacyRecord>>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    pub fn containers(mut self, containers: Arc<dyn ContainerResolver>) -> Self {
        self.containers = Some(containers);
        self
    }

    pub fn identities(mut self, identities: Arc<dyn IdentityResolver>) -> Self {
        self.identities = Some(identities);
        self
    }

    pub fn relocator(mut self, relocator: Arc<dyn DataRelocator>) -> Self {
        self.relocator = Some(relocator);
        self
    }

    pub fn policy(mut self, policy: Arc<dyn ConflictPolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn progress(mut self, progress: Arc<dyn ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn build(self) -> Result<Migrator, BuildError> {
        self.config.validate()?;

        let mut missing = Vec::new();
        if self.source.is_none() {
            missing.push("source");
        }
        if self.lifecycle.is_none() {
            missing.push("lifecycle");
        }
        if self.store.is_none() {
            missing.push("store");
        }
        if self.containers.is_none() {
            missing.push("containers");
        }
        if self.identities.is_none() {
            missing.push("identities");
        }
        if self.relocator.is_none() {
            missing.push("relocator");
        }

        let (
            Some(source),
            Some(lifecycle),
            Some(store),
            Some(containers),
            Some(identities),
            Some(relocator),
        ) = (
            self.source,
            self.lifecycle,
            self.store,
            self.containers,
            self.identities,
            self.relocator,
        )
        else {
            return Err(BuildError::MissingCollaborators(missing));
        };

        let scheduler = self.scheduler.unwrap_or_else(|| {
            Arc::new(TokioBatchScheduler::new(self.config.max_parallel))
                as Arc<dyn BatchScheduler<LegacyRecord>>
        });

        let relocation = RelocationPlan {
            from: self.config.legacy_dir(),
            to: self.config.migrated_dir(),
        };
        let commit = CommitPhase::new(
            lifecycle,
            relocator,
            Arc::clone(&store),
            Arc::clone(&self.progress),
            relocation,
        );

        Ok(Migrator {
            name: self.name,
            owner: self.owner,
            priority: self.priority,
            source,
            store,
            scheduler,
            validator: Validator::new(containers),
            transformer: Transformer::new(identities, self.config.plugin_origin.clone()),
            policy: self.policy,
            progress: self.progress,
            commit: Arc::new(commit),
            clock: self.clock,
        })
    }
}

impl Default for MigratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
