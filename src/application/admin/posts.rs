//! The current user's posts and the block editor used to write them.

use std::sync::Arc;

use quire_api_types::{CreatePostPayload, Post, StoredBlock, UpdatePostPayload};
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    application::{
        content::{ApiImageStore, ContentError, delete_orphaned_images, materialize_content},
        error::AppError,
        repos::{ImagesRepo, PostsRepo, RepoError},
        resource::{Confirmation, DeleteOutcome},
        session::{PostDraft, Session},
        toasts::Notices,
    },
    domain::{
        content::{BlockKey, EditingBlock, PendingImage, editing_from_stored},
        editor::{EditorError, ImagePreview, PostEditor, image_preview},
        error::DomainError,
    },
    presentation::admin::views::{
        AdminPostCardView, AdminPostEditorView, AdminPostListView, EditorBlockView,
        EditorImageView,
    },
};

pub const POSTS_PATH: &str = "/posts";
const EMPTY_TITLE_MESSAGE: &str = "The title cannot be empty.";
const LOAD_FAILED_MESSAGE: &str = "Failed to load posts";
const DELETE_PROMPT: &str = "Are you sure you want to delete this post?";
const ORPHAN_CLEANUP_FAILED_MESSAGE: &str =
    "Some removed images could not be deleted, so the post was not saved.";

#[derive(Debug, Error)]
pub enum PostDraftError {
    #[error("draft `{0}` does not exist in this session")]
    UnknownDraft(String),
    #[error(transparent)]
    BlockKey(#[from] DomainError),
    #[error(transparent)]
    Editor(#[from] EditorError),
    #[error("`{content_type}` is not an image")]
    UnsupportedFile { content_type: String },
}

impl From<PostDraftError> for AppError {
    fn from(err: PostDraftError) -> Self {
        match err {
            PostDraftError::UnknownDraft(_) => AppError::NotFound,
            PostDraftError::BlockKey(err) => AppError::Domain(err),
            other => AppError::validation(other.to_string()),
        }
    }
}

/// Result of pressing "Save as Draft" or "Publish Post".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The title failed validation; nothing was sent.
    Invalid,
    /// Another save of this draft is still running.
    Ignored,
    /// The post now exists upstream; the editor moved on to the fresh `draft`.
    Created { post_id: String, draft: String },
    Updated { post_id: String },
    Failed,
}

enum SaveStart {
    Busy,
    Invalid,
    Ready(SaveSnapshot),
}

struct SaveSnapshot {
    post_id: Option<String>,
    title: String,
    blocks: Vec<EditingBlock>,
    original: Vec<StoredBlock>,
}

#[derive(Debug, Error)]
enum SaveFailure {
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error(transparent)]
    Content(#[from] ContentError),
}

#[derive(Clone)]
pub struct PostsService {
    posts: Arc<dyn PostsRepo>,
    images: Arc<dyn ImagesRepo>,
    image_base: String,
    max_upload_bytes: u64,
}

impl PostsService {
    pub fn new(
        posts: Arc<dyn PostsRepo>,
        images: Arc<dyn ImagesRepo>,
        image_base: impl Into<String>,
        max_upload_bytes: u64,
    ) -> Self {
        Self {
            posts,
            images,
            image_base: image_base.into(),
            max_upload_bytes,
        }
    }

    pub async fn load(&self, session: &Session, notices: &Notices) {
        let collection = &session.collections().posts;
        let ticket = collection.begin_load();
        let user = session.user();

        match self
            .posts
            .list_posts_by_user(session.credentials(), &user.id)
            .await
        {
            Ok(posts) => {
                info!(
                    target = "quire::application::admin::posts",
                    user_id = %user.id,
                    posts = posts.len(),
                    "loaded posts"
                );
                collection.finish_load(ticket, posts);
            }
            Err(err) => {
                warn!(
                    target = "quire::application::admin::posts",
                    error = %err,
                    "failed to load posts"
                );
                notices.error(LOAD_FAILED_MESSAGE);
                collection.abandon_load(ticket);
            }
        }
    }

    pub fn list_view(&self, session: &Session) -> AdminPostListView {
        let collection = &session.collections().posts;
        AdminPostListView {
            heading: "My posts".to_string(),
            is_loading: collection.is_loading(),
            empty_message: "You have not written any posts yet.".to_string(),
            posts: collection.snapshot().iter().map(post_card).collect(),
            load_action: format!("{POSTS_PATH}/panel"),
            new_post_href: format!("{POSTS_PATH}/new"),
        }
    }

    pub async fn delete_post(
        &self,
        session: &Session,
        notices: &Notices,
        id: &str,
        confirmation: Confirmation,
    ) -> Result<DeleteOutcome, RepoError> {
        if confirmation == Confirmation::Pending {
            return Ok(DeleteOutcome::ConfirmationRequired(DELETE_PROMPT.to_string()));
        }
        match self.posts.delete_post(session.credentials(), id).await {
            Ok(()) => {
                session.collections().posts.apply_deleted(id);
                notices.success("Post deleted successfully.");
                Ok(DeleteOutcome::Deleted)
            }
            Err(err) => {
                notices.repo_error(&err);
                Err(err)
            }
        }
    }

    /// Open an empty draft for a new post.
    pub fn new_draft(&self, session: &Session) -> String {
        session.open_draft(PostDraft::new())
    }

    /// Drop a draft the user navigated away from. Returns whether it existed.
    pub fn close_draft(&self, session: &Session, draft_key: &str) -> bool {
        session.discard_draft(draft_key).is_some()
    }

    /// Load a post into a fresh draft.
    pub async fn open_existing(
        &self,
        session: &Session,
        notices: &Notices,
        id: &str,
    ) -> Result<String, RepoError> {
        let post = match self.posts.get_post(session.credentials(), id).await {
            Ok(post) => post,
            Err(err) => {
                notices.repo_error(&err);
                return Err(err);
            }
        };

        let draft = PostDraft {
            post_id: Some(post.id.clone()),
            title: post.title.clone(),
            editor: PostEditor::new(editing_from_stored(&post.content, &post.images)),
            original: post.content,
            published: post.published,
            ..PostDraft::new()
        };
        Ok(session.open_draft(draft))
    }

    pub fn editor_view(
        &self,
        session: &Session,
        draft_key: &str,
    ) -> Result<AdminPostEditorView, PostDraftError> {
        let draft = session
            .draft(draft_key)
            .ok_or_else(|| PostDraftError::UnknownDraft(draft_key.to_string()))?;
        let read_only = draft.saving || draft.editor.is_read_only();
        let base = draft_path(draft_key);

        let blocks = draft
            .editor
            .blocks()
            .iter()
            .map(|block| self.block_view(&base, block))
            .collect();

        Ok(AdminPostEditorView {
            heading: if draft.post_id.is_some() {
                "Edit post".to_string()
            } else {
                "Create post".to_string()
            },
            title: draft.title,
            title_placeholder: "Post title".to_string(),
            title_error: draft.title_error,
            read_only,
            blocks,
            empty_message: "This post has no content yet. Add a paragraph or an image."
                .to_string(),
            title_action: format!("{base}/title"),
            add_paragraph_action: format!("{base}/paragraphs"),
            add_image_action: format!("{base}/images"),
            draft_action: format!("{base}/save"),
            publish_action: format!("{base}/publish"),
            discard_action: format!("{base}/discard"),
            is_saving: draft.saving,
            max_upload_bytes: self.max_upload_bytes,
        })
    }

    fn block_view(&self, base: &str, block: &EditingBlock) -> EditorBlockView {
        let key = block.key().to_string();
        let block_base = format!("{base}/blocks/{key}");
        let (kind, content, image) = match block {
            EditingBlock::Paragraph { content, .. } => ("paragraph", content.clone(), None),
            EditingBlock::Image { key, source } => {
                let image = match image_preview(*key, source, &self.image_base) {
                    ImagePreview::Local { key } => EditorImageView {
                        src: Some(format!("{base}/images/{key}")),
                        alt: source
                            .pending()
                            .map(|image| image.file_name.clone())
                            .unwrap_or_default(),
                        placeholder: String::new(),
                    },
                    ImagePreview::Remote { url, alt } => EditorImageView {
                        src: Some(url),
                        alt,
                        placeholder: String::new(),
                    },
                    ImagePreview::Placeholder => EditorImageView {
                        src: None,
                        alt: String::new(),
                        placeholder: "Image pending or unavailable".to_string(),
                    },
                };
                ("image", String::new(), Some(image))
            }
        };

        EditorBlockView {
            key,
            kind,
            content,
            placeholder: "Write a paragraph...".to_string(),
            image,
            update_action: format!("{block_base}/text"),
            replace_action: format!("{block_base}/image"),
            remove_action: format!("{block_base}/remove"),
        }
    }

    /// Bytes of a pending image, for the draft preview.
    pub fn pending_image(
        &self,
        session: &Session,
        draft_key: &str,
        block: &str,
    ) -> Result<Option<PendingImage>, PostDraftError> {
        let key: BlockKey = block.parse()?;
        let draft = session
            .draft(draft_key)
            .ok_or_else(|| PostDraftError::UnknownDraft(draft_key.to_string()))?;
        Ok(draft.editor.pending_image(key).cloned())
    }

    pub fn set_title(
        &self,
        session: &Session,
        draft_key: &str,
        title: &str,
    ) -> Result<(), PostDraftError> {
        self.with_draft(session, draft_key, |draft| {
            draft.title = title.to_string();
            if !title.trim().is_empty() {
                draft.title_error = None;
            }
            Ok(())
        })
    }

    pub fn add_paragraph(&self, session: &Session, draft_key: &str) -> Result<(), PostDraftError> {
        self.with_editor(session, draft_key, |editor| editor.add_paragraph().map(drop))
    }

    pub fn update_paragraph(
        &self,
        session: &Session,
        draft_key: &str,
        block: &str,
        text: &str,
    ) -> Result<(), PostDraftError> {
        let key: BlockKey = block.parse()?;
        self.with_editor(session, draft_key, |editor| editor.update_paragraph(key, text))
    }

    pub fn add_image(
        &self,
        session: &Session,
        draft_key: &str,
        image: PendingImage,
    ) -> Result<(), PostDraftError> {
        ensure_image(&image)?;
        self.with_editor(session, draft_key, |editor| editor.add_image(image).map(drop))
    }

    pub fn replace_image(
        &self,
        session: &Session,
        draft_key: &str,
        block: &str,
        image: PendingImage,
    ) -> Result<(), PostDraftError> {
        ensure_image(&image)?;
        let key: BlockKey = block.parse()?;
        self.with_editor(session, draft_key, |editor| {
            editor.replace_image(key, image).map(drop)
        })
    }

    pub fn remove_block(
        &self,
        session: &Session,
        draft_key: &str,
        block: &str,
    ) -> Result<(), PostDraftError> {
        let key: BlockKey = block.parse()?;
        self.with_editor(session, draft_key, |editor| editor.remove(key).map(drop))
    }

    /// Save the draft, creating the post first when it does not exist yet.
    ///
    /// A new post is created with empty content, then its pending images are
    /// uploaded against the new id and the post is updated with the final
    /// content. An existing post uploads first, then deletes the images its
    /// content no longer references, then updates.
    pub async fn save(
        &self,
        session: &Session,
        notices: &Notices,
        draft_key: &str,
        title: Option<&str>,
        publish: bool,
    ) -> Result<SaveOutcome, PostDraftError> {
        let start = session
            .update_draft(draft_key, |draft| {
                if let Some(title) = title {
                    draft.title = title.to_string();
                }
                if draft.saving {
                    return SaveStart::Busy;
                }
                if draft.title.trim().is_empty() {
                    draft.title_error = Some(EMPTY_TITLE_MESSAGE.to_string());
                    return SaveStart::Invalid;
                }
                draft.title_error = None;
                draft.saving = true;
                draft.editor.set_read_only(true);
                SaveStart::Ready(SaveSnapshot {
                    post_id: draft.post_id.clone(),
                    title: draft.title.trim().to_string(),
                    blocks: draft.editor.blocks().to_vec(),
                    original: draft.original.clone(),
                })
            })
            .ok_or_else(|| PostDraftError::UnknownDraft(draft_key.to_string()))?;

        let snapshot = match start {
            SaveStart::Busy => return Ok(SaveOutcome::Ignored),
            SaveStart::Invalid => return Ok(SaveOutcome::Invalid),
            SaveStart::Ready(snapshot) => snapshot,
        };

        let store = ApiImageStore::new(self.images.clone(), session.credentials().clone());
        let result = match snapshot.post_id.as_deref() {
            None => {
                self.create_post(session, &store, draft_key, &snapshot, publish)
                    .await
            }
            Some(id) => self.update_post(session, &store, id, &snapshot, publish).await,
        };

        match result {
            Ok((post, content)) => {
                let post_id = post.id.clone();
                let created = snapshot.post_id.is_none();
                let next_draft = if created {
                    session.collections().posts.apply_updated(post);
                    notices.success(if publish {
                        "Post published successfully!"
                    } else {
                        "Draft saved successfully!"
                    });
                    session.discard_draft(draft_key);
                    Some(session.open_draft(PostDraft::new()))
                } else {
                    let editor = PostEditor::new(editing_from_stored(&content, &post.images));
                    session.collections().posts.apply_updated(post);
                    notices.success("Post updated successfully!");
                    session.update_draft(draft_key, |draft| {
                        draft.editor = editor;
                        draft.original = content;
                        draft.published = publish;
                        draft.saving = false;
                    });
                    None
                };
                info!(
                    target = "quire::application::admin::posts",
                    post_id = %post_id,
                    published = publish,
                    created,
                    "post saved"
                );
                Ok(match next_draft {
                    Some(draft) => SaveOutcome::Created { post_id, draft },
                    None => SaveOutcome::Updated { post_id },
                })
            }
            Err(err) => {
                warn!(
                    target = "quire::application::admin::posts",
                    error = %err,
                    "post save failed"
                );
                match &err {
                    SaveFailure::Content(ContentError::Delete { .. }) => {
                        notices.error(ORPHAN_CLEANUP_FAILED_MESSAGE)
                    }
                    SaveFailure::Content(err) => notices.repo_error(err.repo_error()),
                    SaveFailure::Repo(err) => notices.repo_error(err),
                }
                session.update_draft(draft_key, |draft| {
                    draft.saving = false;
                    draft.editor.set_read_only(false);
                });
                Ok(SaveOutcome::Failed)
            }
        }
    }

    async fn create_post(
        &self,
        session: &Session,
        store: &ApiImageStore,
        draft_key: &str,
        snapshot: &SaveSnapshot,
        publish: bool,
    ) -> Result<(Post, Vec<StoredBlock>), SaveFailure> {
        let auth = session.credentials();
        let created = self
            .posts
            .create_post(
                auth,
                &CreatePostPayload {
                    title: snapshot.title.clone(),
                    content: Vec::new(),
                    published: publish,
                    author_id: session.user().id,
                },
            )
            .await?;

        // A retry after a later failure updates this post instead of creating another.
        session.update_draft(draft_key, |draft| draft.post_id = Some(created.id.clone()));
        session.collections().posts.apply_created(created.clone());

        let content = materialize_content(store, &created.id, &snapshot.blocks).await?;
        let updated = self
            .posts
            .update_post(
                auth,
                &created.id,
                &UpdatePostPayload {
                    title: None,
                    content: Some(content.clone()),
                    published: Some(publish),
                },
            )
            .await?;
        Ok((merge_post(created, updated, &content), content))
    }

    async fn update_post(
        &self,
        session: &Session,
        store: &ApiImageStore,
        post_id: &str,
        snapshot: &SaveSnapshot,
        publish: bool,
    ) -> Result<(Post, Vec<StoredBlock>), SaveFailure> {
        let content = materialize_content(store, post_id, &snapshot.blocks).await?;
        let deleted = delete_orphaned_images(store, &snapshot.original, &snapshot.blocks).await?;
        if !deleted.is_empty() {
            info!(
                target = "quire::application::admin::posts",
                post_id,
                deleted = deleted.len(),
                "deleted orphaned images"
            );
        }
        let updated = self
            .posts
            .update_post(
                session.credentials(),
                post_id,
                &UpdatePostPayload {
                    title: Some(snapshot.title.clone()),
                    content: Some(content.clone()),
                    published: Some(publish),
                },
            )
            .await?;
        let post = Post {
            id: post_id.to_string(),
            title: snapshot.title.clone(),
            ..updated
        };
        Ok((post, content))
    }

    fn with_draft(
        &self,
        session: &Session,
        draft_key: &str,
        f: impl FnOnce(&mut PostDraft) -> Result<(), PostDraftError>,
    ) -> Result<(), PostDraftError> {
        session
            .update_draft(draft_key, f)
            .unwrap_or_else(|| Err(PostDraftError::UnknownDraft(draft_key.to_string())))
    }

    fn with_editor(
        &self,
        session: &Session,
        draft_key: &str,
        f: impl FnOnce(&mut PostEditor) -> Result<(), EditorError>,
    ) -> Result<(), PostDraftError> {
        self.with_draft(session, draft_key, |draft| {
            if draft.saving {
                return Err(EditorError::ReadOnly.into());
            }
            f(&mut draft.editor).map_err(PostDraftError::from)
        })
    }
}

pub fn draft_path(draft_key: &str) -> String {
    format!("{POSTS_PATH}/drafts/{draft_key}")
}

fn ensure_image(image: &PendingImage) -> Result<(), PostDraftError> {
    if image.content_type.starts_with("image/") {
        Ok(())
    } else {
        Err(PostDraftError::UnsupportedFile {
            content_type: image.content_type.clone(),
        })
    }
}

/// The update response may omit fields; keep what the create response and the
/// submitted content already established.
fn merge_post(created: Post, updated: Post, content: &[StoredBlock]) -> Post {
    Post {
        id: created.id,
        title: if updated.title.is_empty() {
            created.title
        } else {
            updated.title
        },
        published: updated.published,
        content: if updated.content.is_empty() {
            content.to_vec()
        } else {
            updated.content
        },
        images: updated.images,
    }
}

fn post_card(post: &Post) -> AdminPostCardView {
    let title = if post.title.trim().is_empty() {
        "Untitled post".to_string()
    } else {
        post.title.clone()
    };
    let (status_key, status_label) = if post.published {
        ("published", "Published")
    } else {
        ("draft", "Draft")
    };
    let count = post
        .content
        .iter()
        .filter(|block| matches!(block, StoredBlock::Image { .. }))
        .count();
    let image_count_label = match count {
        1 => "1 image".to_string(),
        n => format!("{n} images"),
    };

    AdminPostCardView {
        id: post.id.clone(),
        title,
        status_key,
        status_label,
        image_count_label,
        edit_href: format!("{POSTS_PATH}/{}/edit", post.id),
        delete_action: format!("{POSTS_PATH}/{}/delete", post.id),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use bytes::Bytes;

    use super::*;
    use crate::{
        application::{
            repos::Credentials,
            session::{MAX_DRAFTS_PER_SESSION, SessionStore},
            toasts::NoticeKind,
        },
        domain::session::SessionUser,
    };

    #[derive(Default)]
    struct FakeBlog {
        calls: Mutex<Vec<String>>,
        stored: Mutex<Option<Post>>,
        fail_update: bool,
        fail_image_delete: bool,
    }

    impl FakeBlog {
        fn record(&self, call: String) {
            self.calls.lock().expect("calls").push(call);
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().expect("calls").clone()
        }
    }

    #[async_trait]
    impl PostsRepo for FakeBlog {
        async fn list_posts_by_user(
            &self,
            _auth: &Credentials,
            user_id: &str,
        ) -> Result<Vec<Post>, RepoError> {
            self.record(format!("list {user_id}"));
            Err(RepoError::transport("down"))
        }

        async fn get_post(&self, _auth: &Credentials, id: &str) -> Result<Post, RepoError> {
            self.record(format!("get {id}"));
            self.stored
                .lock()
                .expect("stored")
                .clone()
                .ok_or(RepoError::NotFound)
        }

        async fn create_post(
            &self,
            _auth: &Credentials,
            payload: &CreatePostPayload,
        ) -> Result<Post, RepoError> {
            self.record(format!("create {} {}", payload.title, payload.content.len()));
            Ok(Post {
                id: "p1".into(),
                title: payload.title.clone(),
                published: payload.published,
                content: Vec::new(),
                images: Vec::new(),
            })
        }

        async fn update_post(
            &self,
            _auth: &Credentials,
            id: &str,
            payload: &UpdatePostPayload,
        ) -> Result<Post, RepoError> {
            let blocks = payload.content.as_ref().map(Vec::len).unwrap_or_default();
            self.record(format!("update {id} {blocks}"));
            if self.fail_update {
                return Err(RepoError::Rejected {
                    status: 500,
                    messages: vec!["nope".into()],
                });
            }
            Ok(Post {
                id: id.into(),
                title: payload.title.clone().unwrap_or_default(),
                published: payload.published.unwrap_or_default(),
                content: payload.content.clone().unwrap_or_default(),
                images: Vec::new(),
            })
        }

        async fn delete_post(&self, _auth: &Credentials, id: &str) -> Result<(), RepoError> {
            self.record(format!("delete {id}"));
            Ok(())
        }
    }

    #[async_trait]
    impl ImagesRepo for FakeBlog {
        async fn upload_post_image(
            &self,
            _auth: &Credentials,
            post_id: &str,
            image: &PendingImage,
        ) -> Result<String, RepoError> {
            self.record(format!("upload {post_id} {}", image.file_name));
            Ok(format!("img-{}", image.file_name))
        }

        async fn delete_image(&self, _auth: &Credentials, id: &str) -> Result<(), RepoError> {
            self.record(format!("delete-image {id}"));
            if self.fail_image_delete {
                return Err(RepoError::transport("gone"));
            }
            Ok(())
        }
    }

    fn service(blog: &Arc<FakeBlog>) -> PostsService {
        PostsService::new(blog.clone(), blog.clone(), "http://api.test", 1024)
    }

    fn session() -> Arc<Session> {
        let store = SessionStore::new(Duration::from_secs(60));
        let user = SessionUser {
            id: "u1".into(),
            name: None,
            email: "writer@example.com".into(),
            role_name: Some("editor".into()),
        };
        store.create(user, Credentials::bearer("t"))
    }

    fn png(name: &str) -> PendingImage {
        PendingImage::new(name, "image/png", Bytes::from_static(b"png"))
    }

    #[tokio::test]
    async fn new_posts_are_created_then_filled_in() {
        let blog = Arc::new(FakeBlog::default());
        let service = service(&blog);
        let session = session();
        let notices = Notices::new();
        let draft = service.new_draft(&session);

        service.add_paragraph(&session, &draft).expect("paragraph");
        service.add_image(&session, &draft, png("a.png")).expect("image");

        let outcome = service
            .save(&session, &notices, &draft, Some("Hello"), true)
            .await
            .expect("save");

        let SaveOutcome::Created { post_id, draft: next } = outcome else {
            panic!("expected a created post, got {outcome:?}");
        };
        assert_eq!(post_id, "p1");
        assert_eq!(
            blog.calls(),
            vec!["create Hello 0", "upload p1 a.png", "update p1 2"]
        );
        let drained = notices.drain();
        assert_eq!(drained[0].lines, vec!["Post published successfully!"]);

        assert!(session.draft(&draft).is_none());
        let fresh = session.draft(&next).expect("fresh draft");
        assert!(fresh.title.is_empty());
        assert!(fresh.editor.is_empty());
        assert!(fresh.post_id.is_none());
        assert_eq!(session.draft_count(), 1);
        assert_eq!(session.collections().posts.len(), 1);
        let stored = session.collections().posts.find("p1").expect("listed");
        assert_eq!(stored.content.len(), 2);
    }

    #[tokio::test]
    async fn an_empty_title_blocks_the_save() {
        let blog = Arc::new(FakeBlog::default());
        let service = service(&blog);
        let session = session();
        let notices = Notices::new();
        let draft = service.new_draft(&session);

        let outcome = service
            .save(&session, &notices, &draft, Some("   "), false)
            .await
            .expect("save");

        assert_eq!(outcome, SaveOutcome::Invalid);
        assert!(blog.calls().is_empty());
        let view = service.editor_view(&session, &draft).expect("view");
        assert_eq!(view.title_error.as_deref(), Some(EMPTY_TITLE_MESSAGE));
    }

    #[tokio::test]
    async fn editing_deletes_images_no_longer_referenced() {
        let blog = Arc::new(FakeBlog {
            stored: Mutex::new(Some(Post {
                id: "p9".into(),
                title: "Old".into(),
                published: true,
                content: vec![
                    StoredBlock::Image { id: "A".into() },
                    StoredBlock::Image { id: "B".into() },
                ],
                images: Vec::new(),
            })),
            ..Default::default()
        });
        let service = service(&blog);
        let session = session();
        let notices = Notices::new();

        let draft = service
            .open_existing(&session, &notices, "p9")
            .await
            .expect("open");
        let first = session.draft(&draft).expect("draft").editor.blocks()[0].key();
        service
            .remove_block(&session, &draft, &first.to_string())
            .expect("remove");
        service.add_image(&session, &draft, png("d.png")).expect("image");

        let outcome = service
            .save(&session, &notices, &draft, None, true)
            .await
            .expect("save");

        assert_eq!(outcome, SaveOutcome::Updated { post_id: "p9".into() });
        let calls = blog.calls();
        assert_eq!(
            calls,
            vec!["get p9", "upload p9 d.png", "delete-image A", "update p9 2"]
        );
        let position = |call: &str| calls.iter().position(|c| c == call).expect(call);
        assert!(position("delete-image A") < position("update p9 2"));
        let saved = session.draft(&draft).expect("draft");
        assert_eq!(saved.editor.pending_count(), 0);
        assert!(!saved.saving);
    }

    #[tokio::test]
    async fn failed_saves_unlock_the_editor() {
        let blog = Arc::new(FakeBlog {
            fail_update: true,
            ..Default::default()
        });
        let service = service(&blog);
        let session = session();
        let notices = Notices::new();
        let draft = service.new_draft(&session);

        let outcome = service
            .save(&session, &notices, &draft, Some("Title"), false)
            .await
            .expect("save");

        assert_eq!(outcome, SaveOutcome::Failed);
        let draft = session.draft(&draft).expect("draft");
        assert!(!draft.saving);
        assert!(!draft.editor.is_read_only());
        assert_eq!(draft.post_id.as_deref(), Some("p1"));
        assert_eq!(notices.drain()[0].lines, vec!["nope"]);
        let listed = session.collections().posts.find("p1").expect("created post listed");
        assert_eq!(listed.title, "Title");
    }

    #[tokio::test]
    async fn orphan_cleanup_failures_stop_before_the_update() {
        let blog = Arc::new(FakeBlog {
            stored: Mutex::new(Some(Post {
                id: "p9".into(),
                title: "Old".into(),
                published: false,
                content: vec![StoredBlock::Image { id: "A".into() }],
                images: Vec::new(),
            })),
            fail_image_delete: true,
            ..Default::default()
        });
        let service = service(&blog);
        let session = session();
        let notices = Notices::new();
        let draft = service
            .open_existing(&session, &notices, "p9")
            .await
            .expect("open");
        let only = session.draft(&draft).expect("draft").editor.blocks()[0].key();
        service
            .remove_block(&session, &draft, &only.to_string())
            .expect("remove");

        let outcome = service
            .save(&session, &notices, &draft, None, false)
            .await
            .expect("save");

        assert_eq!(outcome, SaveOutcome::Failed);
        assert_eq!(blog.calls(), vec!["get p9", "delete-image A"]);
        assert_eq!(notices.drain()[0].lines, vec![ORPHAN_CLEANUP_FAILED_MESSAGE]);
        assert!(!session.draft(&draft).expect("draft").saving);
    }

    #[tokio::test]
    async fn drafts_stay_bounded_across_visits() {
        let blog = Arc::new(FakeBlog {
            stored: Mutex::new(Some(Post {
                id: "p9".into(),
                title: "Old".into(),
                published: true,
                content: Vec::new(),
                images: Vec::new(),
            })),
            ..Default::default()
        });
        let service = service(&blog);
        let session = session();
        let notices = Notices::new();

        let mut last = String::new();
        for _ in 0..MAX_DRAFTS_PER_SESSION + 5 {
            service.new_draft(&session);
            last = service
                .open_existing(&session, &notices, "p9")
                .await
                .expect("open");
        }

        assert_eq!(session.draft_count(), MAX_DRAFTS_PER_SESSION);
        assert!(session.draft(&last).is_some());
        assert!(service.close_draft(&session, &last));
        assert!(!service.close_draft(&session, &last));
        assert_eq!(session.draft_count(), MAX_DRAFTS_PER_SESSION - 1);
    }

    #[tokio::test]
    async fn load_failures_keep_prior_posts() {
        let blog = Arc::new(FakeBlog::default());
        let service = service(&blog);
        let session = session();
        let notices = Notices::new();

        service.load(&session, &notices).await;

        let drained = notices.drain();
        assert_eq!(drained[0].kind, NoticeKind::Error);
        assert_eq!(drained[0].lines, vec![LOAD_FAILED_MESSAGE]);
        assert!(!service.list_view(&session).is_loading);
    }

    #[test]
    fn cards_describe_each_post() {
        let card = post_card(&Post {
            id: "7".into(),
            title: " ".into(),
            published: false,
            content: vec![StoredBlock::Image { id: "i".into() }],
            images: Vec::new(),
        });
        assert_eq!(card.title, "Untitled post");
        assert_eq!(card.status_label, "Draft");
        assert_eq!(card.image_count_label, "1 image");
        assert_eq!(card.delete_action, "/posts/7/delete");
    }

    #[test]
    fn non_images_are_refused() {
        let blog = Arc::new(FakeBlog::default());
        let service = service(&blog);
        let session = session();
        let draft = service.new_draft(&session);
        let err = service
            .add_image(
                &session,
                &draft,
                PendingImage::new("notes.txt", "text/plain", Bytes::new()),
            )
            .expect_err("refused");
        assert!(matches!(err, PostDraftError::UnsupportedFile { .. }));
    }
}
