//! Object storage backends for blob data.

use std::path::PathBuf;
use std::sync::Arc;

use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::ObjectStore;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;

/// Where blob bytes live.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BlobStoreConfig {
    /// A directory on local disk. Each owner gets a subdirectory.
    Local { path: PathBuf },
    /// Process memory. Contents are lost on drop.
    #[default]
    Memory,
}

/// Thin handle over the configured `object_store` backend.
#[derive(Debug, Clone)]
pub struct Storage {
    inner: Arc<dyn ObjectStore>,
}

impl Storage {
    pub async fn new(config: BlobStoreConfig) -> Result<Self> {
        let inner: Arc<dyn ObjectStore> = match config {
            BlobStoreConfig::Local { path } => {
                // LocalFileSystem canonicalizes its prefix, so the root has to exist
                tokio::fs::create_dir_all(&path).await?;
                info!(path = %path.display(), "using local blob storage");
                Arc::new(LocalFileSystem::new_with_prefix(&path)?)
            }
            BlobStoreConfig::Memory => {
                info!("using in-memory blob storage");
                Arc::new(InMemory::new())
            }
        };

        Ok(Self { inner })
    }

    pub(crate) fn inner(&self) -> &Arc<dyn ObjectStore> {
        &self.inner
    }
}
