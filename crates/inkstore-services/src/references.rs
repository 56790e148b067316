//! Reference tracking between owners (notes) and stored blobs.
//!
//! The diff is pure set arithmetic over the previously and currently
//! referenced ids; applying the resulting events to the metadata repository
//! is an explicit call by the caller, not a bus subscription.

use std::collections::HashSet;
use std::sync::Arc;

use inkstore_core::{AppError, FileResourceId, ReferenceCategory, ReferenceInfo};

use crate::repository::FileResourceRepository;

/// Link change produced by comparing an owner's old and new reference lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceEvent {
    Added {
        owner_id: String,
        file_id: FileResourceId,
        category: ReferenceCategory,
    },
    Removed {
        owner_id: String,
        file_id: FileResourceId,
    },
}

/// Diff an owner's reference lists into link/unlink events.
///
/// Emits `Removed` for every id in `old` but not `new` (in `old` order),
/// then `Added` for every id in `new` but not `old` (in `new` order). Ids
/// present in both produce nothing, so equal-as-sets lists yield an empty
/// diff.
pub fn diff_references(
    owner_id: &str,
    category: ReferenceCategory,
    old: &[FileResourceId],
    new: &[FileResourceId],
) -> Vec<ReferenceEvent> {
    let old_set: HashSet<FileResourceId> = old.iter().copied().collect();
    let new_set: HashSet<FileResourceId> = new.iter().copied().collect();

    let mut events = Vec::new();

    for id in old {
        if !new_set.contains(id) {
            events.push(ReferenceEvent::Removed {
                owner_id: owner_id.to_string(),
                file_id: *id,
            });
        }
    }

    for id in new {
        if !old_set.contains(id) {
            events.push(ReferenceEvent::Added {
                owner_id: owner_id.to_string(),
                file_id: *id,
                category,
            });
        }
    }

    events
}

/// Applies reference events to the metadata repository.
pub struct ReferenceListener {
    repository: Arc<dyn FileResourceRepository>,
}

impl ReferenceListener {
    pub fn new(repository: Arc<dyn FileResourceRepository>) -> Self {
        Self { repository }
    }

    /// Apply one event.
    ///
    /// `Removed` clears the target's reference only while it still points at
    /// the removing owner, so replaying the same removal is a no-op.
    /// `Added` overwrites whatever reference is present: a blob claimed by a
    /// second owner forgets the first. Events targeting records that no
    /// longer exist are skipped.
    pub async fn apply(&self, event: &ReferenceEvent) -> Result<(), AppError> {
        match event {
            ReferenceEvent::Added {
                owner_id,
                file_id,
                category,
            } => {
                let Some(mut resource) = self.repository.find_by_id(*file_id).await? else {
                    tracing::debug!(
                        file_id = %file_id,
                        owner_id = %owner_id,
                        "Reference add targets a missing record, skipping"
                    );
                    return Ok(());
                };

                resource.set_reference(Some(ReferenceInfo::new(owner_id.clone(), *category)));
                self.repository.save(&resource).await?;

                tracing::debug!(
                    file_id = %file_id,
                    owner_id = %owner_id,
                    "Reference added"
                );
            }
            ReferenceEvent::Removed { owner_id, file_id } => {
                let Some(mut resource) = self.repository.find_by_id(*file_id).await? else {
                    tracing::debug!(
                        file_id = %file_id,
                        owner_id = %owner_id,
                        "Reference removal targets a missing record, skipping"
                    );
                    return Ok(());
                };

                let points_at_owner = resource
                    .reference
                    .as_ref()
                    .is_some_and(|r| r.owner_id == *owner_id);
                if points_at_owner {
                    resource.set_reference(None);
                    self.repository.save(&resource).await?;

                    tracing::debug!(
                        file_id = %file_id,
                        owner_id = %owner_id,
                        "Reference removed"
                    );
                }
            }
        }
        Ok(())
    }

    /// Apply a batch of events in order.
    pub async fn apply_all(&self, events: &[ReferenceEvent]) -> Result<(), AppError> {
        for event in events {
            self.apply(event).await?;
        }
        Ok(())
    }
}
