//! Domain models shared across inkstore components.

pub mod file_resource;
pub mod reference;

pub use file_resource::{FileResource, FileResourceId, StorageKind, FORMAT_VERSION};
pub use reference::{ReferenceCategory, ReferenceInfo};
