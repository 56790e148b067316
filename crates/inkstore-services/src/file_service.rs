//! Upload/download orchestration.
//!
//! `FileService` ties the container store, the crypto layer, the metadata
//! repository and the preview generators together. It owns the failure
//! policy: encryption or container-write errors abort an upload and remove
//! every container written so far, while a preview conversion failure only
//! costs the pages.

use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use tokio_util::io::ReaderStream;

use inkstore_core::{AppError, FileResource, FileResourceId, ReferenceInfo, StorageKind};
use inkstore_crypto::{
    decrypt_stream, encrypt_stream, open_range, CryptoError, EncryptOptions, KeyLength,
    DEFAULT_KDF_ITERATIONS,
};
use inkstore_storage::{ContainerKey, ContainerStore, StorageError};

use crate::repository::FileResourceRepository;
use crate::thumbnail::{self, ThumbnailConfig, ThumbnailKind};

/// Crypto and hashing parameters applied to every upload.
#[derive(Debug, Clone, Copy)]
pub struct FileServiceConfig {
    pub key_length: KeyLength,
    pub kdf_iterations: u32,
    pub bcrypt_cost: u32,
}

impl Default for FileServiceConfig {
    fn default() -> Self {
        Self {
            key_length: KeyLength::Bits256,
            kdf_iterations: DEFAULT_KDF_ITERATIONS,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

/// One upload. The payload is buffered once and feeds both the encryption
/// and the preview paths.
pub struct UploadRequest {
    pub data: Vec<u8>,
    pub filename: String,
    pub content_type: String,
    pub password: String,
    pub owner: Option<ReferenceInfo>,
}

/// A download body with its content type. The body is a finite stream;
/// dropping it mid-way releases the underlying container handle.
pub struct Download {
    pub content_type: String,
    pub body: Pin<Box<dyn Stream<Item = Result<Bytes, AppError>> + Send>>,
}

impl std::fmt::Debug for Download {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Download")
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

pub struct FileService {
    store: Arc<dyn ContainerStore>,
    repository: Arc<dyn FileResourceRepository>,
    thumbnails: ThumbnailConfig,
    config: FileServiceConfig,
}

impl FileService {
    pub fn new(
        store: Arc<dyn ContainerStore>,
        repository: Arc<dyn FileResourceRepository>,
        thumbnails: ThumbnailConfig,
        config: FileServiceConfig,
    ) -> Self {
        Self {
            store,
            repository,
            thumbnails,
            config,
        }
    }

    fn encrypt_options(&self) -> EncryptOptions {
        EncryptOptions {
            key_length: self.config.key_length,
            iterations: self.config.kdf_iterations,
        }
    }

    /// Encrypt and store one payload, returning the full resource record.
    ///
    /// Preview pages are generated from the same buffered payload and
    /// encrypted under the same password as sibling containers. A preview
    /// *conversion* failure degrades to an empty page list; any container
    /// write failure aborts the upload and removes everything written.
    pub async fn upload(&self, request: UploadRequest) -> Result<FileResource, AppError> {
        let start = std::time::Instant::now();
        let id = FileResourceId::generate();
        let mut written: Vec<ContainerKey> = Vec::new();

        // A key joins the cleanup list before its write starts, so a write
        // that fails partway still gets its half-written container removed.
        written.push(ContainerKey::root(id));
        let size = match self
            .write_container(&ContainerKey::root(id), &request.data, &request.password)
            .await
        {
            Ok(size) => size,
            Err(e) => {
                self.remove_containers(&written).await;
                return Err(e);
            }
        };

        let pages = self
            .generate_preview_pages(&request.data, &request.filename)
            .await;
        for (index, page) in pages.iter().enumerate() {
            let key = ContainerKey::thumbnail(id, (index + 1) as u32);
            written.push(key);
            if let Err(e) = self.write_container(&key, page, &request.password).await {
                self.remove_containers(&written).await;
                return Err(e);
            }
        }

        let password_hash = match bcrypt::hash(&request.password, self.config.bcrypt_cost) {
            Ok(hash) => hash,
            Err(e) => {
                self.remove_containers(&written).await;
                return Err(AppError::Internal(format!("Password hashing failed: {}", e)));
            }
        };

        let mut resource = FileResource::new_local(
            id,
            request.filename,
            request.content_type,
            size,
            password_hash,
            request.owner,
        );
        resource.set_thumbnail_pages((1..=pages.len() as u32).collect());

        if let Err(e) = self.repository.save(&resource).await {
            self.remove_containers(&written).await;
            return Err(e);
        }

        tracing::info!(
            id = %id,
            filename = %resource.original_filename,
            size_bytes = size,
            page_count = pages.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Upload complete"
        );

        Ok(resource)
    }

    /// Store a small payload inline in the metadata record, unencrypted.
    pub async fn upload_inline(
        &self,
        data: Vec<u8>,
        filename: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Result<FileResource, AppError> {
        let resource =
            FileResource::new_inline(FileResourceId::generate(), filename, content_type, data);
        self.repository.save(&resource).await?;

        tracing::info!(
            id = %resource.id,
            filename = %resource.original_filename,
            size_bytes = resource.size,
            "Inline upload complete"
        );

        Ok(resource)
    }

    /// Stream a resource's plaintext, or one of its preview pages.
    ///
    /// The password feeds key derivation only; a wrong password yields
    /// garbage bytes, not an error. `check_password` is the authorization
    /// gate.
    pub async fn download(
        &self,
        id: FileResourceId,
        page: Option<u32>,
        password: &str,
    ) -> Result<Download, AppError> {
        let resource = self.require(id).await?;

        match resource.kind {
            StorageKind::Database => {
                if page.is_some() {
                    return Err(AppError::NotFound(format!(
                        "resource {} has no preview pages",
                        id
                    )));
                }
                let data = resource.inline_data.ok_or_else(|| {
                    AppError::Internal(format!("resource {} is missing its inline payload", id))
                })?;
                Ok(Download {
                    content_type: resource.content_type,
                    body: Box::pin(futures::stream::once(async move {
                        Ok::<_, AppError>(Bytes::from(data))
                    })),
                })
            }
            StorageKind::Local => {
                let (key, content_type) = match page {
                    None => (ContainerKey::root(id), resource.content_type.clone()),
                    Some(n) => {
                        if !resource.thumbnail_pages.contains(&n) {
                            return Err(AppError::NotFound(format!(
                                "resource {} has no page {}",
                                id, n
                            )));
                        }
                        let content_type = ThumbnailKind::detect(&resource.original_filename)
                            .map(|k| k.page_content_type().to_string())
                            .unwrap_or_else(|| "application/octet-stream".to_string());
                        (ContainerKey::thumbnail(id, n), content_type)
                    }
                };

                let reader = self.store.open(&key).await.map_err(map_storage_error)?;
                let reader = decrypt_stream(reader, password, &self.encrypt_options())
                    .await
                    .map_err(map_crypto_error)?;

                Ok(Download {
                    content_type,
                    body: stream_body(reader),
                })
            }
        }
    }

    /// Stream the decrypted byte range `start..=end` of the root payload.
    pub async fn download_range(
        &self,
        id: FileResourceId,
        start: u64,
        end: u64,
        password: &str,
    ) -> Result<Download, AppError> {
        let resource = self.require(id).await?;

        if resource.kind != StorageKind::Local {
            return Err(AppError::InvalidInput(format!(
                "resource {} does not support ranged reads",
                id
            )));
        }

        let reader = self
            .store
            .open(&ContainerKey::root(id))
            .await
            .map_err(map_storage_error)?;
        let reader = open_range(reader, password, &self.encrypt_options(), start, end)
            .await
            .map_err(map_crypto_error)?;

        Ok(Download {
            content_type: resource.content_type,
            body: stream_body(reader),
        })
    }

    /// Delete a resource. Returns `false` if it never existed.
    ///
    /// The metadata record goes first, then the containers: a crash in
    /// between leaves at most orphaned bytes, never a record pointing at
    /// missing bytes.
    pub async fn delete(&self, id: FileResourceId) -> Result<bool, AppError> {
        let Some(resource) = self.repository.find_by_id(id).await? else {
            return Ok(false);
        };

        self.repository.delete(id).await?;

        if resource.kind == StorageKind::Local {
            self.store
                .delete(&ContainerKey::root(id))
                .await
                .map_err(map_storage_error)?;
            for page in &resource.thumbnail_pages {
                self.store
                    .delete(&ContainerKey::thumbnail(id, *page))
                    .await
                    .map_err(map_storage_error)?;
            }
        }

        tracing::info!(
            id = %id,
            page_count = resource.thumbnail_pages.len(),
            "Resource deleted"
        );

        Ok(true)
    }

    /// Verify a password candidate against the stored hash. Never touches
    /// the containers. Records without a hash accept any candidate.
    pub async fn check_password(
        &self,
        id: FileResourceId,
        candidate: &str,
    ) -> Result<bool, AppError> {
        let resource = self.require(id).await?;

        match &resource.password_hash {
            None => Ok(true),
            Some(hash) => bcrypt::verify(candidate, hash)
                .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e))),
        }
    }

    async fn require(&self, id: FileResourceId) -> Result<FileResource, AppError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("file resource {} not found", id)))
    }

    async fn write_container(
        &self,
        key: &ContainerKey,
        plaintext: &[u8],
        password: &str,
    ) -> Result<u64, AppError> {
        use tokio::io::AsyncWriteExt;

        let mut writer = self.store.create(key).await.map_err(map_storage_error)?;
        let size = encrypt_stream(
            &mut &plaintext[..],
            &mut writer,
            password,
            &self.encrypt_options(),
        )
        .await
        .map_err(map_crypto_error)?;
        writer
            .shutdown()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to finish container write: {}", e)))?;

        Ok(size)
    }

    /// Run the preview generator for this filename, if any. Conversion
    /// failures are logged and cost only the pages.
    async fn generate_preview_pages(&self, data: &[u8], filename: &str) -> Vec<Vec<u8>> {
        let Some(kind) = ThumbnailKind::detect(filename) else {
            return Vec::new();
        };

        match thumbnail::generate_pages(kind, data, filename, &self.thumbnails).await {
            Ok(pages) => pages,
            Err(e) => {
                tracing::warn!(
                    filename = %filename,
                    error = %e,
                    "Preview generation failed, continuing without pages"
                );
                Vec::new()
            }
        }
    }

    async fn remove_containers(&self, keys: &[ContainerKey]) {
        for key in keys {
            if let Err(e) = self.store.delete(key).await {
                tracing::warn!(key = %key, error = %e, "Failed to remove container during abort");
            }
        }
    }
}

/// Mid-stream read failures surface as `StreamFailure` items, never as
/// silent truncation.
fn stream_body<R>(reader: R) -> Pin<Box<dyn Stream<Item = Result<Bytes, AppError>> + Send>>
where
    R: tokio::io::AsyncRead + Send + 'static,
{
    Box::pin(
        ReaderStream::new(reader)
            .map(|chunk| chunk.map_err(|e| AppError::StreamFailure(e.to_string()))),
    )
}

fn map_crypto_error(e: CryptoError) -> AppError {
    match e {
        CryptoError::CorruptHeader => AppError::CorruptContainer(e.to_string()),
        CryptoError::InvalidRange { start, end } => AppError::InvalidRange { start, end },
        CryptoError::Io(io) => AppError::Storage(format!("IO error: {}", io)),
        other => AppError::Crypto(other.to_string()),
    }
}

fn map_storage_error(e: StorageError) -> AppError {
    match e {
        StorageError::NotFound(key) => AppError::NotFound(format!("container {} not found", key)),
        other => AppError::Storage(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryFileRepository;
    use inkstore_storage::LocalContainerStore;
    use tempfile::tempdir;

    async fn service_in(dir: &std::path::Path) -> FileService {
        let store = Arc::new(LocalContainerStore::new(dir).await.unwrap());
        let repo = Arc::new(InMemoryFileRepository::new());
        let config = FileServiceConfig {
            key_length: KeyLength::Bits256,
            kdf_iterations: 2048,
            bcrypt_cost: 4,
        };
        FileService::new(store, repo, ThumbnailConfig::default(), config)
    }

    async fn collect(download: Download) -> Vec<u8> {
        let mut body = download.body;
        let mut out = Vec::new();
        while let Some(chunk) = body.next().await {
            out.extend_from_slice(&chunk.unwrap());
        }
        out
    }

    #[tokio::test]
    async fn test_inline_upload_roundtrip() {
        let dir = tempdir().unwrap();
        let service = service_in(dir.path()).await;

        let resource = service
            .upload_inline(b"tiny icon".to_vec(), "icon.svg", "image/svg+xml")
            .await
            .unwrap();
        assert_eq!(resource.kind, StorageKind::Database);
        assert!(!resource.encrypted);

        let download = service.download(resource.id, None, "").await.unwrap();
        assert_eq!(download.content_type, "image/svg+xml");
        assert_eq!(collect(download).await, b"tiny icon");
    }

    #[tokio::test]
    async fn test_inline_resource_has_no_pages() {
        let dir = tempdir().unwrap();
        let service = service_in(dir.path()).await;

        let resource = service
            .upload_inline(b"x".to_vec(), "icon.svg", "image/svg+xml")
            .await
            .unwrap();
        let err = service.download(resource.id, Some(1), "").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_inline_resource_accepts_any_password() {
        let dir = tempdir().unwrap();
        let service = service_in(dir.path()).await;

        let resource = service
            .upload_inline(b"x".to_vec(), "icon.svg", "image/svg+xml")
            .await
            .unwrap();
        assert!(service.check_password(resource.id, "anything").await.unwrap());
    }

    #[tokio::test]
    async fn test_download_unknown_id_is_not_found() {
        let dir = tempdir().unwrap();
        let service = service_in(dir.path()).await;

        let err = service
            .download(FileResourceId::generate(), None, "pw")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_range_download_rejects_inline_resource() {
        let dir = tempdir().unwrap();
        let service = service_in(dir.path()).await;

        let resource = service
            .upload_inline(b"x".to_vec(), "icon.svg", "image/svg+xml")
            .await
            .unwrap();
        let err = service
            .download_range(resource.id, 0, 10, "")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }
}
