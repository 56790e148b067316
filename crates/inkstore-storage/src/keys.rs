//! Typed container keys.
//!
//! Key layout: `{resource_id}/root.enc` for the main payload,
//! `{resource_id}/page-{n}.enc` for preview pages. Keys are built from a
//! `FileResourceId` (a uuid) and a page tag, so no key component can carry
//! separators or traversal sequences.

use std::fmt;

use inkstore_core::FileResourceId;

/// Which container of a resource a key addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    /// The encrypted original payload.
    Root,
    /// A preview page, numbered from 1.
    Thumbnail(u32),
}

/// Address of one container within the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContainerKey {
    pub id: FileResourceId,
    pub page: Page,
}

impl ContainerKey {
    pub fn root(id: FileResourceId) -> Self {
        Self {
            id,
            page: Page::Root,
        }
    }

    pub fn thumbnail(id: FileResourceId, page: u32) -> Self {
        Self {
            id,
            page: Page::Thumbnail(page),
        }
    }

    /// Path of this container relative to the store root.
    pub fn relative_path(&self) -> String {
        match self.page {
            Page::Root => format!("{}/root.enc", self.id),
            Page::Thumbnail(n) => format!("{}/page-{}.enc", self.id, n),
        }
    }
}

impl fmt::Display for ContainerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.relative_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        let id = FileResourceId::generate();
        assert_eq!(
            ContainerKey::root(id).relative_path(),
            format!("{}/root.enc", id)
        );
        assert_eq!(
            ContainerKey::thumbnail(id, 3).relative_path(),
            format!("{}/page-3.enc", id)
        );
    }

    #[test]
    fn test_keys_of_one_resource_share_a_directory() {
        let id = FileResourceId::generate();
        let root = ContainerKey::root(id).relative_path();
        let page = ContainerKey::thumbnail(id, 1).relative_path();
        assert_eq!(
            root.split('/').next().unwrap(),
            page.split('/').next().unwrap()
        );
    }
}
