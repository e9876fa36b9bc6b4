//! shopmigrate-core
//!
//! Moves legacy shop records into a live target store.
//!
//! # Modules
//! - **domain**: records, coordinates, kinds, conflict policy, outcomes, errors
//! - **ports**: collaborator traits (LegacySource, TargetStore, BatchScheduler, ...)
//! - **app**: the pipeline (extraction, staging, commit phase, Migrator)
//! - **impls**: in-memory and tokio implementations of the ports
//! - **config**: JSON migration config

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod ports;

#[cfg(test)]
mod testing;
