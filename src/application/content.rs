//! Side effects of saving post content: image uploads and orphan deletion.
//!
//! The translation itself lives in [`crate::domain::content`]; this module walks a
//! [`SavePlan`](crate::domain::content::SavePlan) against an [`ImageStore`].

use std::sync::Arc;

use async_trait::async_trait;
use quire_api_types::StoredBlock;
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    application::repos::{Credentials, ImagesRepo, RepoError},
    domain::content::{EditingBlock, PendingImage, PlannedBlock, orphaned_image_ids, plan_save},
};

/// Storage for post images.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Upload an image attached to `post_id` and return its new id.
    async fn upload(&self, post_id: &str, image: &PendingImage) -> Result<String, RepoError>;

    async fn delete(&self, id: &str) -> Result<(), RepoError>;
}

/// [`ImageStore`] backed by the images API on behalf of one session.
#[derive(Clone)]
pub struct ApiImageStore {
    repo: Arc<dyn ImagesRepo>,
    auth: Credentials,
}

impl ApiImageStore {
    pub fn new(repo: Arc<dyn ImagesRepo>, auth: Credentials) -> Self {
        Self { repo, auth }
    }
}

#[async_trait]
impl ImageStore for ApiImageStore {
    async fn upload(&self, post_id: &str, image: &PendingImage) -> Result<String, RepoError> {
        self.repo.upload_post_image(&self.auth, post_id, image).await
    }

    async fn delete(&self, id: &str) -> Result<(), RepoError> {
        self.repo.delete_image(&self.auth, id).await
    }
}

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("image upload failed: {0}")]
    Upload(#[source] RepoError),
    #[error("deleting image {id} failed after removing {deleted} image(s): {source}")]
    Delete {
        id: String,
        deleted: usize,
        #[source]
        source: RepoError,
    },
}

impl ContentError {
    pub fn repo_error(&self) -> &RepoError {
        match self {
            ContentError::Upload(source) | ContentError::Delete { source, .. } => source,
        }
    }
}

/// Produce stored content for `content`, uploading pending images in order.
///
/// Uploads run one at a time; the first failure aborts the save and images
/// already uploaded stay on the server.
pub async fn materialize_content(
    store: &dyn ImageStore,
    post_id: &str,
    content: &[EditingBlock],
) -> Result<Vec<StoredBlock>, ContentError> {
    let plan = plan_save(content);
    if !plan.dropped.is_empty() {
        info!(
            target = "quire::application::content",
            post_id,
            dropped = plan.dropped.len(),
            "dropping image blocks without a source"
        );
    }

    let mut stored = Vec::with_capacity(plan.blocks.len());
    for block in plan.blocks {
        match block {
            PlannedBlock::Ready(block) => stored.push(block),
            PlannedBlock::Upload { key, image } => {
                let id = store
                    .upload(post_id, image)
                    .await
                    .map_err(ContentError::Upload)?;
                info!(
                    target = "quire::application::content",
                    post_id,
                    block = %key,
                    image_id = %id,
                    bytes = image.len(),
                    "uploaded post image"
                );
                stored.push(StoredBlock::Image { id });
            }
        }
    }
    Ok(stored)
}

/// Delete images referenced by `original` that `edited` no longer uses.
///
/// Deletions run sequentially and stop at the first failure; nothing is rolled back.
/// Returns the ids that were deleted.
pub async fn delete_orphaned_images(
    store: &dyn ImageStore,
    original: &[StoredBlock],
    edited: &[EditingBlock],
) -> Result<Vec<String>, ContentError> {
    let orphaned = orphaned_image_ids(original, edited);
    let mut deleted = Vec::with_capacity(orphaned.len());
    for id in orphaned {
        if let Err(source) = store.delete(&id).await {
            warn!(
                target = "quire::application::content",
                image_id = %id,
                deleted = deleted.len(),
                error = %source,
                "failed to delete orphaned image"
            );
            return Err(ContentError::Delete {
                id,
                deleted: deleted.len(),
                source,
            });
        }
        deleted.push(id);
    }
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use bytes::Bytes;
    use quire_api_types::ImageInfo;

    use super::*;
    use crate::domain::content::editing_from_stored;

    #[derive(Default)]
    struct RecordingStore {
        uploads: Mutex<Vec<(String, String)>>,
        deletes: Mutex<Vec<String>>,
        fail_delete: Option<&'static str>,
    }

    #[async_trait]
    impl ImageStore for RecordingStore {
        async fn upload(&self, post_id: &str, image: &PendingImage) -> Result<String, RepoError> {
            let mut uploads = self.uploads.lock().expect("uploads");
            uploads.push((post_id.to_string(), image.file_name.clone()));
            Ok(format!("new-{}", uploads.len()))
        }

        async fn delete(&self, id: &str) -> Result<(), RepoError> {
            if self.fail_delete == Some(id) {
                return Err(RepoError::transport("boom"));
            }
            self.deletes.lock().expect("deletes").push(id.to_string());
            Ok(())
        }
    }

    fn image(id: &str) -> StoredBlock {
        StoredBlock::Image { id: id.into() }
    }

    fn paragraph(text: &str) -> StoredBlock {
        StoredBlock::Paragraph {
            content: text.into(),
        }
    }

    fn pending(name: &str) -> EditingBlock {
        EditingBlock::pending_image(PendingImage::new(
            name,
            "image/png",
            Bytes::from_static(b"png"),
        ))
    }

    #[tokio::test]
    async fn replacing_images_uploads_new_and_deletes_removed() {
        let original = vec![image("A"), paragraph("hi"), image("B"), image("C")];
        let infos: Vec<ImageInfo> = Vec::new();
        let mut edited: Vec<EditingBlock> = editing_from_stored(&original, &infos)
            .into_iter()
            .filter(|block| match block {
                EditingBlock::Image { source, .. } => source.persisted_id() == Some("B"),
                EditingBlock::Paragraph { .. } => true,
            })
            .collect();
        edited.push(pending("d.png"));

        let store = RecordingStore::default();
        let stored = materialize_content(&store, "post-1", &edited)
            .await
            .expect("materialize");
        assert_eq!(stored, vec![paragraph("hi"), image("B"), image("new-1")]);
        assert_eq!(
            *store.uploads.lock().expect("uploads"),
            vec![("post-1".to_string(), "d.png".to_string())]
        );

        let deleted = delete_orphaned_images(&store, &original, &edited)
            .await
            .expect("delete");
        assert_eq!(deleted, vec!["A", "C"]);
        assert_eq!(*store.deletes.lock().expect("deletes"), vec!["A", "C"]);
    }

    #[tokio::test]
    async fn persisted_content_needs_no_uploads() {
        let original = vec![paragraph("one"), image("B")];
        let edited = editing_from_stored(&original, &[]);
        let store = RecordingStore::default();

        let stored = materialize_content(&store, "p", &edited).await.expect("stored");
        assert_eq!(stored, original);
        assert!(store.uploads.lock().expect("uploads").is_empty());
        assert!(
            delete_orphaned_images(&store, &original, &edited)
                .await
                .expect("delete")
                .is_empty()
        );
    }

    #[tokio::test]
    async fn deletion_stops_at_the_first_failure() {
        let original = vec![image("A"), image("B"), image("C")];
        let store = RecordingStore {
            fail_delete: Some("B"),
            ..Default::default()
        };

        let err = delete_orphaned_images(&store, &original, &[])
            .await
            .expect_err("delete should fail");
        assert!(matches!(err, ContentError::Delete { ref id, deleted: 1, .. } if id == "B"));
        assert_eq!(*store.deletes.lock().expect("deletes"), vec!["A"]);
    }
}
