//! Metadata repositories.
//!
//! The repository holds `FileResource` records and nothing else; container
//! bytes live in the store. Two implementations: an in-memory map for tests
//! and embedding, and a JSON-file index that persists across process runs.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::RwLock;

use inkstore_core::{AppError, FileResource, FileResourceId};

/// Persistence boundary for file resource metadata.
///
/// `save` is an upsert and revalidates the aggregate on every call, so an
/// invalid record can never reach the index.
#[async_trait]
pub trait FileResourceRepository: Send + Sync {
    async fn find_by_id(&self, id: FileResourceId) -> Result<Option<FileResource>, AppError>;

    async fn save(&self, resource: &FileResource) -> Result<(), AppError>;

    /// Delete a record. Returns whether it existed.
    async fn delete(&self, id: FileResourceId) -> Result<bool, AppError>;
}

/// Map-backed repository with no persistence.
#[derive(Clone, Default)]
pub struct InMemoryFileRepository {
    records: Arc<RwLock<HashMap<FileResourceId, FileResource>>>,
}

impl InMemoryFileRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FileResourceRepository for InMemoryFileRepository {
    async fn find_by_id(&self, id: FileResourceId) -> Result<Option<FileResource>, AppError> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn save(&self, resource: &FileResource) -> Result<(), AppError> {
        resource.validate()?;
        self.records
            .write()
            .await
            .insert(resource.id, resource.clone());
        Ok(())
    }

    async fn delete(&self, id: FileResourceId) -> Result<bool, AppError> {
        Ok(self.records.write().await.remove(&id).is_some())
    }
}

/// JSON-file-backed repository.
///
/// The whole index is one JSON document, rewritten on every mutation via a
/// temp file and rename so a crash mid-write leaves the previous index
/// intact. Suited to the single-process CLI, not to concurrent writers.
pub struct JsonFileRepository {
    path: PathBuf,
    records: RwLock<HashMap<FileResourceId, FileResource>>,
}

impl JsonFileRepository {
    /// Open (or create) the index at `path`.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let path = path.into();

        let records = match fs::read(&path).await {
            Ok(bytes) => {
                let list: Vec<FileResource> = serde_json::from_slice(&bytes)?;
                list.into_iter().map(|r| (r.id, r)).collect()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                return Err(AppError::Storage(format!(
                    "Failed to read index {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        tracing::debug!(
            path = %path.display(),
            record_count = records.len(),
            "Metadata index opened"
        );

        Ok(Self {
            path,
            records: RwLock::new(records),
        })
    }

    /// Rewrite the index from the given snapshot. Callers hold the write
    /// lock across the rewrite so mutations serialize.
    async fn persist(
        &self,
        records: &HashMap<FileResourceId, FileResource>,
    ) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut list: Vec<&FileResource> = records.values().collect();
        list.sort_by_key(|r| r.id);
        let bytes = serde_json::to_vec_pretty(&list)?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, &bytes).await?;
        fs::rename(&tmp, &self.path).await?;

        Ok(())
    }
}

#[async_trait]
impl FileResourceRepository for JsonFileRepository {
    async fn find_by_id(&self, id: FileResourceId) -> Result<Option<FileResource>, AppError> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn save(&self, resource: &FileResource) -> Result<(), AppError> {
        resource.validate()?;
        let mut records = self.records.write().await;
        records.insert(resource.id, resource.clone());
        self.persist(&records).await
    }

    async fn delete(&self, id: FileResourceId) -> Result<bool, AppError> {
        let mut records = self.records.write().await;
        let existed = records.remove(&id).is_some();
        if existed {
            self.persist(&records).await?;
        }
        Ok(existed)
    }
}
