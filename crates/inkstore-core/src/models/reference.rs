use serde::{Deserialize, Serialize};

/// Role in which an external content item owns a blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceCategory {
    /// Embedded inside the content body
    Inline,
    /// Attached to the content item
    Attachment,
    /// Used as the content item's cover image
    Cover,
}

/// Which external content item currently owns a blob, and in what role.
///
/// At most one `(owner, category)` pair is stored per blob: when a second
/// owner claims a blob, the first association is forgotten (last-write-wins,
/// no reference counting). This is a documented limitation of the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceInfo {
    /// Opaque identifier of the owning content item
    pub owner_id: String,
    pub category: ReferenceCategory,
}

impl ReferenceInfo {
    pub fn new(owner_id: impl Into<String>, category: ReferenceCategory) -> Self {
        Self {
            owner_id: owner_id.into(),
            category,
        }
    }
}
