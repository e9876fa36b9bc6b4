//! Error types, one enum per concern.
//!
//! `MigrationError` is what a single record task or the pipeline itself can
//! produce. Collaborator errors (`StoreError`, `IdentityError`,
//! `RelocationError`) stay separate so fakes and real adapters can produce them
//! without knowing about the pipeline.

use std::path::PathBuf;

use thiserror::Error;
use uuid::Uuid;

use super::coordinate::Coordinate;
use super::ids::ShopId;
use super::kind::LegacyKindCode;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("invalid container at {0}")]
    InvalidContainer(Coordinate),

    #[error("unrecognized legacy shop kind code {0}")]
    UnknownKind(LegacyKindCode),

    #[error("identity lookup failed: {0}")]
    Identity(#[from] IdentityError),

    #[error("target store: {0}")]
    Store(#[from] StoreError),

    #[error("batch scheduler dropped the completion signal before all items finished")]
    BarrierBroken,

    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("coordinate {0} is already occupied")]
    Occupied(Coordinate),

    #[error("{0} is not registered")]
    NotFound(ShopId),

    #[error("cannot register a record that already carries identity {0}")]
    AlreadyRegistered(ShopId),

    #[error("flush of {id} failed: {reason}")]
    FlushFailed { id: ShopId, reason: String },
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("unknown identity {0}")]
    Unknown(Uuid),
}

#[derive(Debug, Error)]
pub enum RelocationError {
    #[error("source directory {0} does not exist")]
    SourceMissing(PathBuf),

    #[error("destination {0} already exists")]
    DestinationExists(PathBuf),

    #[error("io error moving directory: {0}")]
    Io(#[from] std::io::Error),
}
