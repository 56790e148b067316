use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::reference::ReferenceInfo;

/// Storage-format version tag written into every new metadata record.
pub const FORMAT_VERSION: &str = "1";

/// Opaque, globally unique, time-ordered identifier of a stored blob.
///
/// Backed by a UUIDv7, so the canonical string form sorts lexicographically
/// in creation order. Immutable once assigned; used as the on-disk directory
/// key and as the public URL path segment.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct FileResourceId(Uuid);

impl FileResourceId {
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for FileResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for FileResourceId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Where a resource's bytes live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    /// Encrypted container(s) on disk
    Local,
    /// Raw bytes inline in the metadata record
    Database,
}

/// Aggregate root for one stored blob.
///
/// Timestamps are explicit fields set by the constructors and by each
/// mutating operation; there is no interception layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileResource {
    pub id: FileResourceId,
    pub original_filename: String,
    pub content_type: String,
    pub kind: StorageKind,
    /// Plaintext byte count, never the ciphertext size
    pub size: u64,
    pub encrypted: bool,
    /// One-way hash used for authorization checks on read; never used for
    /// decryption
    pub password_hash: Option<String>,
    /// Thumbnail page indices, contiguous from 1 when non-empty
    pub thumbnail_pages: Vec<u32>,
    pub format_version: String,
    pub reference: Option<ReferenceInfo>,
    /// Raw payload for `Database`-kind resources
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub inline_data: Option<Vec<u8>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FileResource {
    /// New record for an encrypted on-disk container.
    pub fn new_local(
        id: FileResourceId,
        original_filename: impl Into<String>,
        content_type: impl Into<String>,
        size: u64,
        password_hash: String,
        reference: Option<ReferenceInfo>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            original_filename: original_filename.into(),
            content_type: content_type.into(),
            kind: StorageKind::Local,
            size,
            encrypted: true,
            password_hash: Some(password_hash),
            thumbnail_pages: Vec::new(),
            format_version: FORMAT_VERSION.to_string(),
            reference,
            inline_data: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// New record holding its payload inline, unencrypted.
    pub fn new_inline(
        id: FileResourceId,
        original_filename: impl Into<String>,
        content_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            original_filename: original_filename.into(),
            content_type: content_type.into(),
            kind: StorageKind::Database,
            size: data.len() as u64,
            encrypted: false,
            password_hash: None,
            thumbnail_pages: Vec::new(),
            format_version: FORMAT_VERSION.to_string(),
            reference: None,
            inline_data: Some(data),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn set_reference(&mut self, reference: Option<ReferenceInfo>) {
        self.reference = reference;
        self.updated_at = Utc::now();
    }

    pub fn set_thumbnail_pages(&mut self, pages: Vec<u32>) {
        self.thumbnail_pages = pages;
        self.updated_at = Utc::now();
    }

    /// Check the aggregate invariants. Called on every repository save.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.encrypted && self.password_hash.is_none() {
            return Err(AppError::InvalidInput(
                "encrypted resource is missing a password hash".to_string(),
            ));
        }
        for (i, page) in self.thumbnail_pages.iter().enumerate() {
            if *page != (i as u32) + 1 {
                return Err(AppError::InvalidInput(format!(
                    "thumbnail pages must be contiguous from 1, got {:?}",
                    self.thumbnail_pages
                )));
            }
        }
        if self.kind == StorageKind::Database && self.inline_data.is_none() {
            return Err(AppError::InvalidInput(
                "database-kind resource is missing its inline payload".to_string(),
            ));
        }
        Ok(())
    }
}
