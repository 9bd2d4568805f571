//! Post content in its two shapes.
//!
//! [`StoredBlock`] is what the API persists: image blocks carry only an id.
//! [`EditingBlock`] is what the editor manipulates: every block carries a
//! [`BlockKey`] that never leaves the console, and image blocks know whether
//! their bytes are still local ([`ImageSource::Pending`]), already uploaded
//! ([`ImageSource::Persisted`]) or unavailable ([`ImageSource::Missing`]).
//!
//! The functions here are pure. Uploads and deletions happen in
//! `application::content`, driven by the [`SavePlan`] produced by [`plan_save`].

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use quire_api_types::{ImageInfo, StoredBlock};
use uuid::Uuid;

use super::error::DomainError;

/// Client-only identity of a block, stable for the lifetime of an edit session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockKey(Uuid);

impl BlockKey {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for BlockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for BlockKey {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value.trim())
            .map(Self)
            .map_err(|_| DomainError::InvalidBlockKey {
                value: value.to_string(),
            })
    }
}

/// A locally selected file that has not been uploaded yet.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingImage {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl PendingImage {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Bytes) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    Pending(PendingImage),
    Persisted {
        id: String,
        url: Option<String>,
        original_name: Option<String>,
    },
    Missing,
}

impl ImageSource {
    pub fn persisted_id(&self) -> Option<&str> {
        match self {
            ImageSource::Persisted { id, .. } if !id.is_empty() => Some(id.as_str()),
            _ => None,
        }
    }

    pub fn pending(&self) -> Option<&PendingImage> {
        match self {
            ImageSource::Pending(image) => Some(image),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditingBlock {
    Paragraph { key: BlockKey, content: String },
    Image { key: BlockKey, source: ImageSource },
}

impl EditingBlock {
    pub fn paragraph(content: impl Into<String>) -> Self {
        Self::Paragraph {
            key: BlockKey::generate(),
            content: content.into(),
        }
    }

    pub fn pending_image(image: PendingImage) -> Self {
        Self::Image {
            key: BlockKey::generate(),
            source: ImageSource::Pending(image),
        }
    }

    pub fn key(&self) -> BlockKey {
        match self {
            EditingBlock::Paragraph { key, .. } | EditingBlock::Image { key, .. } => *key,
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, EditingBlock::Image { .. })
    }
}

/// Map stored blocks into the editing shape, assigning a fresh key to each block.
///
/// Image urls and original names are resolved from the post's image metadata
/// when an entry with the same id exists.
pub fn editing_from_stored(content: &[StoredBlock], images: &[ImageInfo]) -> Vec<EditingBlock> {
    content
        .iter()
        .map(|block| match block {
            StoredBlock::Paragraph { content } => EditingBlock::Paragraph {
                key: BlockKey::generate(),
                content: content.clone(),
            },
            StoredBlock::Image { id } => {
                let info = images.iter().find(|info| info.id == *id);
                EditingBlock::Image {
                    key: BlockKey::generate(),
                    source: ImageSource::Persisted {
                        id: id.clone(),
                        url: info.map(|info| info.url.clone()),
                        original_name: info.and_then(|info| info.original_name.clone()),
                    },
                }
            }
        })
        .collect()
}

/// Image ids referenced by stored content, in content order.
pub fn stored_image_ids(content: &[StoredBlock]) -> Vec<String> {
    content
        .iter()
        .filter_map(|block| match block {
            StoredBlock::Image { id } => Some(id.clone()),
            StoredBlock::Paragraph { .. } => None,
        })
        .collect()
}

/// Ids of already-uploaded images still referenced by the editing content.
pub fn editing_image_ids(content: &[EditingBlock]) -> BTreeSet<String> {
    content
        .iter()
        .filter_map(|block| match block {
            EditingBlock::Image { source, .. } => source.persisted_id().map(str::to_string),
            EditingBlock::Paragraph { .. } => None,
        })
        .collect()
}

/// Ids present in the original stored content but no longer referenced by the
/// editing content. Order follows the original content; duplicates collapse.
pub fn orphaned_image_ids(original: &[StoredBlock], edited: &[EditingBlock]) -> Vec<String> {
    let retained = editing_image_ids(edited);
    let mut seen = BTreeSet::new();
    stored_image_ids(original)
        .into_iter()
        .filter(|id| !retained.contains(id))
        .filter(|id| seen.insert(id.clone()))
        .collect()
}

/// One entry of a [`SavePlan`], in content order.
#[derive(Debug, Clone, PartialEq)]
pub enum PlannedBlock<'a> {
    /// Already in stored shape.
    Ready(StoredBlock),
    /// Must be uploaded; the resulting id becomes an image block at this position.
    Upload { key: BlockKey, image: &'a PendingImage },
}

/// The editing content reduced to what a save has to do.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SavePlan<'a> {
    pub blocks: Vec<PlannedBlock<'a>>,
    /// Keys of image blocks with no source; they are omitted from the stored content.
    pub dropped: Vec<BlockKey>,
}

impl SavePlan<'_> {
    pub fn upload_count(&self) -> usize {
        self.blocks
            .iter()
            .filter(|block| matches!(block, PlannedBlock::Upload { .. }))
            .count()
    }

    /// Stored content when nothing needs uploading.
    pub fn ready_content(&self) -> Option<Vec<StoredBlock>> {
        self.blocks
            .iter()
            .map(|block| match block {
                PlannedBlock::Ready(stored) => Some(stored.clone()),
                PlannedBlock::Upload { .. } => None,
            })
            .collect()
    }
}

/// Translate editing content into a save plan.
///
/// A pending file takes precedence over anything else on the block; blocks with
/// neither a pending file nor a persisted id are dropped.
pub fn plan_save(content: &[EditingBlock]) -> SavePlan<'_> {
    let mut plan = SavePlan::default();
    for block in content {
        match block {
            EditingBlock::Paragraph { content, .. } => {
                plan.blocks.push(PlannedBlock::Ready(StoredBlock::Paragraph {
                    content: content.clone(),
                }));
            }
            EditingBlock::Image { key, source } => match source {
                ImageSource::Pending(image) => {
                    plan.blocks.push(PlannedBlock::Upload { key: *key, image });
                }
                ImageSource::Persisted { id, .. } if !id.is_empty() => {
                    plan.blocks
                        .push(PlannedBlock::Ready(StoredBlock::Image { id: id.clone() }));
                }
                ImageSource::Persisted { .. } | ImageSource::Missing => plan.dropped.push(*key),
            },
        }
    }
    plan
}
