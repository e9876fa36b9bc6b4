//! Filesystem relocator: renames the legacy data directory aside.

use std::path::Path;

use async_trait::async_trait;

use crate::domain::RelocationError;
use crate::ports::DataRelocator;

/// Moves directories with `tokio::fs::rename`. Never overwrites the destination.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsRelocator;

#[async_trait]
impl DataRelocator for FsRelocator {
    async fn move_directory(&self, from: &Path, to: &Path) -> Result<(), RelocationError> {
        if !tokio::fs::try_exists(from).await? {
            return Err(RelocationError::SourceMissing(from.to_path_buf()));
        }
        if tokio::fs::try_exists(to).await? {
            return Err(RelocationError::DestinationExists(to.to_path_buf()));
        }
        tokio::fs::rename(from, to).await?;
        Ok(())
    }
}
