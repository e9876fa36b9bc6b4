//! ComponentRegistry - migration components ordered by priority.
//!
//! Higher priority runs first. Components with equal priority keep their
//! registration order.

use std::cmp::Reverse;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{info, warn};

use super::Migrator;

/// One migratable unit, e.g. the shop migrator.
pub trait MigrateComponent: Send + Sync {
    fn name(&self) -> &str;
    fn owner(&self) -> &str;
    fn priority(&self) -> i32;

    /// Start migrating. Returns whether the migration was started.
    fn migrate(&self, override_existing: bool) -> bool;
}

impl MigrateComponent for Migrator {
    fn name(&self) -> &str {
        Migrator::name(self)
    }

    fn owner(&self) -> &str {
        Migrator::owner(self)
    }

    fn priority(&self) -> i32 {
        Migrator::priority(self)
    }

    fn migrate(&self, override_existing: bool) -> bool {
        Migrator::migrate(self, override_existing)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("component '{0}' is already registered")]
    AlreadyRegistered(String),
}

#[derive(Default)]
pub struct ComponentRegistry {
    components: Mutex<Vec<Arc<dyn MigrateComponent>>>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Arc<dyn MigrateComponent>>> {
        self.components.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn resort(components: &mut [Arc<dyn MigrateComponent>]) {
        components.sort_by_key(|c| Reverse(c.priority()));
    }

    pub fn register(&self, component: Arc<dyn MigrateComponent>) -> Result<(), RegistryError> {
        let mut components = self.lock();
        if components.iter().any(|c| c.name() == component.name()) {
            return Err(RegistryError::AlreadyRegistered(component.name().to_string()));
        }
        components.push(component);
        Self::resort(&mut components);
        Ok(())
    }

    /// Removing keeps the remaining order, so no resort.
    pub fn unregister(&self, name: &str) -> bool {
        let mut components = self.lock();
        let before = components.len();
        components.retain(|c| c.name() != name);
        components.len() != before
    }

    /// Remove every component of `owner`; returns how many were removed.
    pub fn unregister_owner(&self, owner: &str) -> usize {
        let mut components = self.lock();
        let before = components.len();
        components.retain(|c| c.owner() != owner);
        before - components.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot in run order.
    pub fn ordered(&self) -> Vec<Arc<dyn MigrateComponent>> {
        self.lock().clone()
    }

    /// Start every component in priority order.
    ///
    /// Runs on a snapshot, so components may (un)register while this runs.
    pub fn run_all(&self, override_existing: bool) -> Vec<(String, bool)> {
        self.ordered()
            .into_iter()
            .map(|component| {
                let started = component.migrate(override_existing);
                if started {
                    info!(component = component.name(), "migration started");
                } else {
                    warn!(component = component.name(), "migration did not start");
                }
                (component.name().to_string(), started)
            })
            .collect()
    }
}
