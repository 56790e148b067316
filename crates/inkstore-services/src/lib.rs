//! Inkstore Services Library
//!
//! Orchestration above the crypto and storage layers: the file service
//! (upload, download, ranged download, delete), metadata repositories,
//! reference tracking, and preview-page generation.

pub mod file_service;
pub mod references;
pub mod repository;
pub mod thumbnail;

// Re-export commonly used types
pub use file_service::{Download, FileService, FileServiceConfig, UploadRequest};
pub use references::{diff_references, ReferenceEvent, ReferenceListener};
pub use repository::{FileResourceRepository, InMemoryFileRepository, JsonFileRepository};
pub use thumbnail::{ThumbnailConfig, ThumbnailKind};
