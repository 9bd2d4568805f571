use askama::Template;

use super::AdminLayout;

#[derive(Clone)]
pub struct AdminPostCardView {
    pub id: String,
    pub title: String,
    pub status_key: &'static str,
    pub status_label: &'static str,
    pub image_count_label: String,
    pub edit_href: String,
    pub delete_action: String,
}

#[derive(Clone)]
pub struct AdminPostListView {
    pub heading: String,
    pub is_loading: bool,
    pub empty_message: String,
    pub posts: Vec<AdminPostCardView>,
    pub load_action: String,
    pub new_post_href: String,
}

impl AdminPostListView {
    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}

#[derive(Template)]
#[template(path = "admin/posts.html")]
pub struct AdminPostsTemplate {
    pub view: AdminLayout<AdminPostListView>,
}

#[derive(Template)]
#[template(path = "admin/posts_panel.html")]
pub struct AdminPostsPanelTemplate {
    pub content: AdminPostListView,
}

#[derive(Clone)]
pub struct EditorImageView {
    pub src: Option<String>,
    pub alt: String,
    pub placeholder: String,
}

#[derive(Clone)]
pub struct EditorBlockView {
    pub key: String,
    /// `paragraph` or `image`.
    pub kind: &'static str,
    pub content: String,
    pub placeholder: String,
    pub image: Option<EditorImageView>,
    pub update_action: String,
    pub replace_action: String,
    pub remove_action: String,
}

#[derive(Clone)]
pub struct AdminPostEditorView {
    pub heading: String,
    pub title: String,
    pub title_placeholder: String,
    pub title_error: Option<String>,
    pub read_only: bool,
    pub blocks: Vec<EditorBlockView>,
    pub empty_message: String,
    pub title_action: String,
    pub add_paragraph_action: String,
    pub add_image_action: String,
    pub draft_action: String,
    pub publish_action: String,
    /// Drops the draft and returns to the post list.
    pub discard_action: String,
    pub is_saving: bool,
    pub max_upload_bytes: u64,
}

impl AdminPostEditorView {
    pub fn has_blocks(&self) -> bool {
        !self.blocks.is_empty()
    }
}

#[derive(Template)]
#[template(path = "admin/post_edit.html")]
pub struct AdminPostEditTemplate {
    pub view: AdminLayout<AdminPostEditorView>,
}

#[derive(Template)]
#[template(path = "admin/post_editor_panel.html")]
pub struct AdminPostEditorPanelTemplate {
    pub content: AdminPostEditorView,
}
