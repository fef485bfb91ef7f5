use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use tokio::fs;
use tracing::{debug, info};

use crate::error::{HarvestError, Result};
use crate::traits::Storage;

/// Stores blobs as files inside one directory, created on first write
#[derive(Debug, Clone)]
pub struct DirectoryStorage {
    root: PathBuf,
}

impl DirectoryStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl Storage for DirectoryStorage {
    async fn save(&self, name: &str, bytes: &[u8]) -> Result<PathBuf> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|source| HarvestError::Storage {
                path: self.root.clone(),
                source,
            })?;

        let path = self.root.join(name);
        fs::write(&path, bytes)
            .await
            .map_err(|source| HarvestError::Storage {
                path: path.clone(),
                source,
            })?;

        debug!("Wrote {} bytes to {}", bytes.len(), path.display());
        Ok(path)
    }
}

/// Write a value as pretty-printed JSON, creating parent directories
pub async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let to_storage_error = |source: std::io::Error| HarvestError::Storage {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await.map_err(to_storage_error)?;
    }

    let json = serde_json::to_vec_pretty(value).map_err(|e| to_storage_error(e.into()))?;
    fs::write(path, json).await.map_err(to_storage_error)?;

    info!("Saved {}", path.display());
    Ok(())
}
