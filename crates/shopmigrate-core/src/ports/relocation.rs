//! DataRelocator port - moving the legacy system's residual on-disk state.

use std::path::Path;

use async_trait::async_trait;

use crate::domain::RelocationError;

#[async_trait]
pub trait DataRelocator: Send + Sync {
    /// Move the directory at `from` to `to`.
    async fn move_directory(&self, from: &Path, to: &Path) -> Result<(), RelocationError>;
}
