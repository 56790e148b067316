//! Container store abstraction trait
//!
//! This module defines the ContainerStore trait that all container backends
//! must implement.

use async_trait::async_trait;
use std::pin::Pin;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncSeek, AsyncWrite};

use crate::keys::ContainerKey;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Container not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Readable, seekable handle to a stored container.
///
/// Seeking is required by ranged decryption, which positions the source at
/// the ciphertext offset instead of reading and discarding.
pub trait ContainerRead: AsyncRead + AsyncSeek + Send + Unpin {}

impl<T: AsyncRead + AsyncSeek + Send + Unpin> ContainerRead for T {}

/// Writable handle to a container being created. Callers must shut the
/// writer down to complete the write.
pub trait ContainerWrite: AsyncWrite + Send + Unpin {}

impl<T: AsyncWrite + Send + Unpin> ContainerWrite for T {}

/// Container store abstraction trait
///
/// Backends hold opaque encrypted containers addressed by `ContainerKey`.
/// The store has no knowledge of passwords, keys, or plaintext; everything
/// above the key layout is the caller's concern.
#[async_trait]
pub trait ContainerStore: Send + Sync {
    /// Open a container for writing, creating it (and any parent grouping)
    /// as needed. An existing container at the same key is replaced.
    async fn create(&self, key: &ContainerKey) -> StorageResult<Pin<Box<dyn ContainerWrite>>>;

    /// Open an existing container for reading.
    async fn open(&self, key: &ContainerKey) -> StorageResult<Pin<Box<dyn ContainerRead>>>;

    /// Check if a container exists
    async fn exists(&self, key: &ContainerKey) -> StorageResult<bool>;

    /// Delete a container. Returns whether it existed; deleting a missing
    /// container is not an error.
    async fn delete(&self, key: &ContainerKey) -> StorageResult<bool>;

    /// Total on-disk length in bytes of an existing container.
    async fn length(&self, key: &ContainerKey) -> StorageResult<u64>;
}
