//! Post list and the block editor.

use axum::{
    body::Body,
    extract::{Form, Path, State},
    http::{HeaderMap, StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::Multipart;
use datastar::prelude::ElementPatchMode;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use super::{
    AppState,
    context::{SessionContext, redirect},
    selectors::{EDITOR_PANEL, MODAL_SLOT, POSTS_PANEL},
    shared::{DeleteForm, close_modal, finish_stream, render_fragment, toasts_only},
};
use crate::{
    application::{
        admin::posts::{POSTS_PATH, PostDraftError, SaveOutcome, draft_path},
        error::{AppError, HttpError},
        resource::{DeleteOutcome, MODAL_CLOSE_PATH},
        stream::StreamBuilder,
        toasts::Notices,
    },
    domain::{content::PendingImage, session::DashboardKind},
    presentation::{admin::views as admin_views, views::render_page},
};

const SOURCE: &str = "quire::infra::http::posts";
const IMAGE_FIELD: &str = "image";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct TitleForm {
    title: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct ParagraphForm {
    content: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct SaveForm {
    title: Option<String>,
}

#[derive(Debug, Error)]
enum ImageFormError {
    #[error("Choose an image to upload.")]
    Missing,
    #[error("The image is larger than the upload limit of {limit_mib} MiB.")]
    TooLarge { limit_mib: u64 },
    #[error("The upload could not be read.")]
    Invalid,
}

fn guard(ctx: &SessionContext) -> Result<(), Response> {
    ctx.require(DashboardKind::Editor)
        .map_err(IntoResponse::into_response)
}

pub(super) async fn posts_page(State(state): State<AppState>, ctx: SessionContext) -> Response {
    if let Err(response) = guard(&ctx) {
        return response;
    }
    let chrome = state
        .chrome
        .load(&ctx.session.user(), ctx.theme, POSTS_PATH);
    let content = state.posts.list_view(&ctx.session);
    let view = admin_views::AdminLayout::new(chrome, content);
    render_page(admin_views::AdminPostsTemplate { view }, StatusCode::OK)
}

pub(super) async fn posts_panel(State(state): State<AppState>, ctx: SessionContext) -> Response {
    if let Err(response) = guard(&ctx) {
        return response;
    }
    let notices = Notices::new();
    state.posts.load(&ctx.session, &notices).await;

    let mut stream = StreamBuilder::new();
    if let Err(err) = push_posts_panel(&mut stream, &state, &ctx) {
        return err.into_response();
    }
    finish_stream(stream, &notices)
}

pub(super) async fn post_delete(
    State(state): State<AppState>,
    ctx: SessionContext,
    Path(id): Path<String>,
    Form(form): Form<DeleteForm>,
) -> Response {
    if let Err(response) = guard(&ctx) {
        return response;
    }
    let notices = Notices::new();
    let result = state
        .posts
        .delete_post(&ctx.session, &notices, &id, form.confirmation())
        .await;

    let mut stream = StreamBuilder::new();
    let pushed = match result {
        Ok(DeleteOutcome::ConfirmationRequired(message)) => render_fragment(
            "infra::http::posts::confirm",
            admin_views::ConfirmDialogTemplate {
                dialog: admin_views::ConfirmDialogView {
                    title: "Please confirm".to_string(),
                    message,
                    confirm_action: format!("{POSTS_PATH}/{id}/delete"),
                    confirm_label: "Delete".to_string(),
                    close_action: MODAL_CLOSE_PATH.to_string(),
                },
            },
        )
        .map(|html| {
            stream.push_patch(html, MODAL_SLOT, ElementPatchMode::Replace);
        }),
        Ok(DeleteOutcome::Deleted) => close_modal(&mut stream)
            .and_then(|()| push_posts_panel(&mut stream, &state, &ctx)),
        Err(_) => close_modal(&mut stream),
    };
    if let Err(err) = pushed {
        return err.into_response();
    }
    finish_stream(stream, &notices)
}

/// Start a fresh draft and send the browser to it.
pub(super) async fn post_new(State(state): State<AppState>, ctx: SessionContext) -> Response {
    if let Err(response) = guard(&ctx) {
        return response;
    }
    let key = state.posts.new_draft(&ctx.session);
    Redirect::to(&draft_path(&key)).into_response()
}

/// Load a stored post into a draft and send the browser to it.
pub(super) async fn post_edit(
    State(state): State<AppState>,
    ctx: SessionContext,
    Path(id): Path<String>,
) -> Response {
    if let Err(response) = guard(&ctx) {
        return response;
    }
    match state
        .posts
        .open_existing(&ctx.session, &Notices::new(), &id)
        .await
    {
        Ok(key) => Redirect::to(&draft_path(&key)).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}

pub(super) async fn draft_page(
    State(state): State<AppState>,
    ctx: SessionContext,
    Path(draft): Path<String>,
) -> Response {
    if let Err(response) = guard(&ctx) {
        return response;
    }
    let content = match state.posts.editor_view(&ctx.session, &draft) {
        Ok(content) => content,
        Err(err) => return AppError::from(err).into_response(),
    };
    let is_new = ctx
        .session
        .draft(&draft)
        .is_some_and(|draft| draft.post_id.is_none());
    let active = if is_new { "/posts/new" } else { POSTS_PATH };
    let chrome = state.chrome.load(&ctx.session.user(), ctx.theme, active);
    let view = admin_views::AdminLayout::new(chrome, content);
    render_page(admin_views::AdminPostEditTemplate { view }, StatusCode::OK)
}

pub(super) async fn draft_title(
    State(state): State<AppState>,
    ctx: SessionContext,
    Path(draft): Path<String>,
    Form(form): Form<TitleForm>,
) -> Response {
    if let Err(response) = guard(&ctx) {
        return response;
    }
    let notices = Notices::new();
    match state.posts.set_title(&ctx.session, &draft, &form.title) {
        Ok(()) => toasts_only(&notices),
        Err(err) => draft_error(err, &notices),
    }
}

pub(super) async fn draft_add_paragraph(
    State(state): State<AppState>,
    ctx: SessionContext,
    Path(draft): Path<String>,
) -> Response {
    if let Err(response) = guard(&ctx) {
        return response;
    }
    let result = state.posts.add_paragraph(&ctx.session, &draft);
    editor_response(&state, &ctx, &draft, result, &Notices::new())
}

pub(super) async fn draft_update_paragraph(
    State(state): State<AppState>,
    ctx: SessionContext,
    Path((draft, block)): Path<(String, String)>,
    Form(form): Form<ParagraphForm>,
) -> Response {
    if let Err(response) = guard(&ctx) {
        return response;
    }
    let notices = Notices::new();
    match state
        .posts
        .update_paragraph(&ctx.session, &draft, &block, &form.content)
    {
        Ok(()) => toasts_only(&notices),
        Err(err) => draft_error(err, &notices),
    }
}

pub(super) async fn draft_add_image(
    State(state): State<AppState>,
    ctx: SessionContext,
    Path(draft): Path<String>,
    mut multipart: Multipart,
) -> Response {
    if let Err(response) = guard(&ctx) {
        return response;
    }
    let notices = Notices::new();
    let image = match read_image(&mut multipart, state.upload_limit_bytes).await {
        Ok(image) => image,
        Err(err) => {
            notices.error(err.to_string());
            return toasts_only(&notices);
        }
    };
    let result = state.posts.add_image(&ctx.session, &draft, image);
    editor_response(&state, &ctx, &draft, result, &notices)
}

pub(super) async fn draft_replace_image(
    State(state): State<AppState>,
    ctx: SessionContext,
    Path((draft, block)): Path<(String, String)>,
    mut multipart: Multipart,
) -> Response {
    if let Err(response) = guard(&ctx) {
        return response;
    }
    let notices = Notices::new();
    let image = match read_image(&mut multipart, state.upload_limit_bytes).await {
        Ok(image) => image,
        Err(err) => {
            notices.error(err.to_string());
            return toasts_only(&notices);
        }
    };
    let result = state
        .posts
        .replace_image(&ctx.session, &draft, &block, image);
    editor_response(&state, &ctx, &draft, result, &notices)
}

pub(super) async fn draft_remove_block(
    State(state): State<AppState>,
    ctx: SessionContext,
    Path((draft, block)): Path<(String, String)>,
) -> Response {
    if let Err(response) = guard(&ctx) {
        return response;
    }
    let result = state.posts.remove_block(&ctx.session, &draft, &block);
    editor_response(&state, &ctx, &draft, result, &Notices::new())
}

/// Serve the bytes of an image that only exists in the draft.
pub(super) async fn draft_image_preview(
    State(state): State<AppState>,
    ctx: SessionContext,
    Path((draft, block)): Path<(String, String)>,
) -> Response {
    if let Err(response) = guard(&ctx) {
        return response;
    }
    match state.posts.pending_image(&ctx.session, &draft, &block) {
        Ok(Some(image)) => Response::builder()
            .status(StatusCode::OK)
            .header(CONTENT_TYPE, image.content_type.as_str())
            .body(Body::from(image.bytes))
            .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response()),
        Ok(None) => AppError::NotFound.into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}

pub(super) async fn draft_save(
    state: State<AppState>,
    ctx: SessionContext,
    draft: Path<String>,
    form: Form<SaveForm>,
) -> Response {
    save(state, ctx, draft, form, false).await
}

pub(super) async fn draft_publish(
    state: State<AppState>,
    ctx: SessionContext,
    draft: Path<String>,
    form: Form<SaveForm>,
) -> Response {
    save(state, ctx, draft, form, true).await
}

async fn save(
    State(state): State<AppState>,
    ctx: SessionContext,
    Path(draft): Path<String>,
    Form(form): Form<SaveForm>,
    publish: bool,
) -> Response {
    if let Err(response) = guard(&ctx) {
        return response;
    }
    let notices = Notices::new();
    let result = state
        .posts
        .save(
            &ctx.session,
            &notices,
            &draft,
            form.title.as_deref(),
            publish,
        )
        .await;
    match result {
        // The saved draft is gone; continue in the empty one that replaced it.
        Ok(SaveOutcome::Created { draft: next, .. }) => match editor_stream(&state, &ctx, &next) {
            Ok(mut stream) => {
                stream.push_replace_url(&draft_path(&next));
                finish_stream(stream, &notices)
            }
            Err(response) => response,
        },
        other => editor_response(&state, &ctx, &draft, other.map(drop), &notices),
    }
}

/// Drop the draft and go back to the post list.
pub(super) async fn draft_discard(
    State(state): State<AppState>,
    ctx: SessionContext,
    headers: HeaderMap,
    Path(draft): Path<String>,
) -> Response {
    if let Err(response) = guard(&ctx) {
        return response;
    }
    state.posts.close_draft(&ctx.session, &draft);
    redirect(&headers, POSTS_PATH)
}

/// Re-render the editor after a mutation, or report why it was refused.
fn editor_response(
    state: &AppState,
    ctx: &SessionContext,
    draft: &str,
    result: Result<(), PostDraftError>,
    notices: &Notices,
) -> Response {
    if let Err(err) = result {
        return draft_error(err, notices);
    }
    match editor_stream(state, ctx, draft) {
        Ok(stream) => finish_stream(stream, notices),
        Err(response) => response,
    }
}

fn editor_stream(
    state: &AppState,
    ctx: &SessionContext,
    draft: &str,
) -> Result<StreamBuilder, Response> {
    let content = state
        .posts
        .editor_view(&ctx.session, draft)
        .map_err(|err| AppError::from(err).into_response())?;
    let html = render_fragment(
        "infra::http::posts::editor",
        admin_views::AdminPostEditorPanelTemplate { content },
    )
    .map_err(IntoResponse::into_response)?;
    let mut stream = StreamBuilder::new();
    stream.push_patch(html, EDITOR_PANEL, ElementPatchMode::Replace);
    Ok(stream)
}

fn draft_error(err: PostDraftError, notices: &Notices) -> Response {
    match err {
        PostDraftError::UnknownDraft(_) | PostDraftError::BlockKey(_) => {
            AppError::from(err).into_response()
        }
        PostDraftError::UnsupportedFile { .. } => {
            notices.error("Only image files can be added to a post.");
            toasts_only(notices)
        }
        PostDraftError::Editor(err) => {
            warn!(target = SOURCE, error = %err, "editor change refused");
            notices.error("The editor is busy. Try again once the save finishes.");
            toasts_only(notices)
        }
    }
}

fn push_posts_panel(
    stream: &mut StreamBuilder,
    state: &AppState,
    ctx: &SessionContext,
) -> Result<(), HttpError> {
    let html = render_fragment(
        "infra::http::posts::panel",
        admin_views::AdminPostsPanelTemplate {
            content: state.posts.list_view(&ctx.session),
        },
    )?;
    stream.push_patch(html, POSTS_PANEL, ElementPatchMode::Replace);
    Ok(())
}

async fn read_image(multipart: &mut Multipart, limit: u64) -> Result<PendingImage, ImageFormError> {
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                if field.name() != Some(IMAGE_FIELD) {
                    continue;
                }
                let file_name = field
                    .file_name()
                    .map(str::to_string)
                    .filter(|value| !value.trim().is_empty())
                    .unwrap_or_else(|| "upload.bin".to_string());
                let content_type = field
                    .content_type()
                    .map(str::to_string)
                    .unwrap_or_else(|| "application/octet-stream".to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|err| multipart_error(err.status(), limit))?;
                if bytes.is_empty() {
                    return Err(ImageFormError::Missing);
                }
                return Ok(PendingImage::new(file_name, content_type, bytes));
            }
            Ok(None) => return Err(ImageFormError::Missing),
            Err(err) => {
                warn!(
                    target = SOURCE,
                    status = err.status().as_u16(),
                    error = %err,
                    "failed to read multipart payload"
                );
                return Err(multipart_error(err.status(), limit));
            }
        }
    }
}

fn multipart_error(status: StatusCode, limit: u64) -> ImageFormError {
    match status {
        StatusCode::PAYLOAD_TOO_LARGE => ImageFormError::TooLarge {
            limit_mib: limit / (1024 * 1024),
        },
        _ => ImageFormError::Invalid,
    }
}
