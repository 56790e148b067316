use std::path::{Path, PathBuf};
use std::pin::Pin;

use async_trait::async_trait;
use tokio::fs;

use crate::keys::ContainerKey;
use crate::traits::{ContainerRead, ContainerStore, ContainerWrite, StorageError, StorageResult};

/// Local filesystem container store.
///
/// One directory per resource under the base path, one file per container.
#[derive(Clone)]
pub struct LocalContainerStore {
    base_path: PathBuf,
}

impl LocalContainerStore {
    /// Create a new LocalContainerStore rooted at `base_path`.
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create container directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalContainerStore { base_path })
    }

    fn key_to_path(&self, key: &ContainerKey) -> PathBuf {
        self.base_path.join(key.relative_path())
    }

    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Drop the resource directory once its last container is gone.
    async fn remove_dir_if_empty(&self, path: &Path) {
        if let Some(parent) = path.parent() {
            if parent != self.base_path {
                // Fails while siblings remain, which is the desired behavior.
                let _ = fs::remove_dir(parent).await;
            }
        }
    }
}

#[async_trait]
impl ContainerStore for LocalContainerStore {
    async fn create(&self, key: &ContainerKey) -> StorageResult<Pin<Box<dyn ContainerWrite>>> {
        let path = self.key_to_path(key);

        self.ensure_parent_dir(&path).await?;

        let file = fs::File::create(&path).await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        tracing::debug!(
            path = %path.display(),
            key = %key,
            "Local container created for writing"
        );

        Ok(Box::pin(file))
    }

    async fn open(&self, key: &ContainerKey) -> StorageResult<Pin<Box<dyn ContainerRead>>> {
        let path = self.key_to_path(key);

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(key.to_string()));
        }

        let file = fs::File::open(&path).await.map_err(|e| {
            StorageError::ReadFailed(format!("Failed to open file {}: {}", path.display(), e))
        })?;

        Ok(Box::pin(file))
    }

    async fn exists(&self, key: &ContainerKey) -> StorageResult<bool> {
        let path = self.key_to_path(key);
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }

    async fn delete(&self, key: &ContainerKey) -> StorageResult<bool> {
        let path = self.key_to_path(key);
        let start = std::time::Instant::now();

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(false);
        }

        fs::remove_file(&path).await.map_err(|e| {
            StorageError::DeleteFailed(format!("Failed to delete file {}: {}", path.display(), e))
        })?;

        self.remove_dir_if_empty(&path).await;

        tracing::info!(
            path = %path.display(),
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local container delete successful"
        );

        Ok(true)
    }

    async fn length(&self, key: &ContainerKey) -> StorageResult<u64> {
        let path = self.key_to_path(key);

        let meta = fs::metadata(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(key.to_string())
            } else {
                StorageError::ReadFailed(e.to_string())
            }
        })?;

        Ok(meta.len())
    }
}
