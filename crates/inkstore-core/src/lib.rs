//! Inkstore Core Library
//!
//! This crate provides the domain models, error types, configuration, and the
//! public URL convention shared by all inkstore components.

pub mod config;
pub mod error;
pub mod models;
pub mod public_url;

// Re-export commonly used types
pub use config::FileStoreConfig;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{
    FileResource, FileResourceId, ReferenceCategory, ReferenceInfo, StorageKind, FORMAT_VERSION,
};
pub use public_url::{id_from_public_url, public_url, PUBLIC_FILE_PREFIX};
