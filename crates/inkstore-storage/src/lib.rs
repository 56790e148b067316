//! Inkstore Storage Library
//!
//! This crate provides the container store abstraction and the local
//! filesystem implementation. A container is an opaque encrypted blob; the
//! store never interprets its contents.
//!
//! # Container key format
//!
//! Containers are grouped per resource, one directory per resource id:
//!
//! - **Root payload**: `{resource_id}/root.enc`
//! - **Preview page n**: `{resource_id}/page-{n}.enc`
//!
//! Keys are derived from typed ids in the `keys` module, never from caller
//! strings, so path traversal is unrepresentable.

pub mod keys;
pub mod local;
pub mod traits;

// Re-export commonly used types
pub use keys::{ContainerKey, Page};
pub use local::LocalContainerStore;
pub use traits::{
    ContainerRead, ContainerStore, ContainerWrite, StorageError, StorageResult,
};
