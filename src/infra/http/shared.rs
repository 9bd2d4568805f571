use std::time::Duration;

use askama::Template;
use axum::response::{IntoResponse, Response};
use datastar::prelude::ElementPatchMode;
use serde::Deserialize;
use uuid::Uuid;

use super::selectors::{MODAL_SLOT, TOAST_STACK};
use crate::{
    application::{
        error::HttpError,
        resource::Confirmation,
        stream::StreamBuilder,
        toasts::{Notice, NoticeKind, Notices},
    },
    presentation::{admin::views as admin_views, views},
};

const SUCCESS_TOAST_TTL: Duration = Duration::from_millis(6000);
const ERROR_TOAST_TTL: Duration = Duration::from_millis(5000);

/// Body of every delete action. The confirm dialog posts `confirmed=true`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct DeleteForm {
    confirmed: Option<String>,
}

impl DeleteForm {
    pub(super) fn confirmation(&self) -> Confirmation {
        match self.confirmed.as_deref().map(str::trim) {
            Some("true" | "1" | "yes" | "on") => Confirmation::Confirmed,
            _ => Confirmation::Pending,
        }
    }
}

fn toast_item(notice: Notice) -> admin_views::AdminToastItem {
    let (kind, ttl) = match notice.kind {
        NoticeKind::Success => ("success", SUCCESS_TOAST_TTL),
        NoticeKind::Error => ("error", ERROR_TOAST_TTL),
    };
    admin_views::AdminToastItem {
        id: Uuid::new_v4().to_string(),
        kind,
        heading: notice.heading.map(str::to_string),
        lines: notice.lines,
        ttl_ms: ttl.as_millis() as u64,
    }
}

/// Patch every notice raised during the request into the toast stack.
pub(super) fn push_toasts(stream: &mut StreamBuilder, notices: &Notices) -> Result<(), HttpError> {
    let toasts: Vec<_> = notices.drain().into_iter().map(toast_item).collect();
    if toasts.is_empty() {
        return Ok(());
    }
    let html = render_fragment(
        "infra::http::push_toasts",
        admin_views::AdminToastStackTemplate { toasts },
    )?;
    stream.push_patch(html, TOAST_STACK, ElementPatchMode::Replace);
    Ok(())
}

pub(super) fn close_modal(stream: &mut StreamBuilder) -> Result<(), HttpError> {
    let html = render_fragment(
        "infra::http::close_modal",
        admin_views::AdminModalSlotTemplate {},
    )?;
    stream.push_patch(html, MODAL_SLOT, ElementPatchMode::Replace);
    Ok(())
}

pub(super) fn render_fragment<T: Template>(
    source: &'static str,
    template: T,
) -> Result<String, HttpError> {
    views::render_fragment(source, &template).map_err(HttpError::from)
}

/// Finish a datastar response, appending any notices.
pub(super) fn finish_stream(mut stream: StreamBuilder, notices: &Notices) -> Response {
    if let Err(err) = push_toasts(&mut stream, notices) {
        return err.into_response();
    }
    stream.into_response()
}

/// A response carrying nothing but the request's notices.
pub(super) fn toasts_only(notices: &Notices) -> Response {
    finish_stream(StreamBuilder::new(), notices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delete_forms_default_to_pending() {
        assert_eq!(DeleteForm::default().confirmation(), Confirmation::Pending);
        let confirmed = DeleteForm {
            confirmed: Some("true".into()),
        };
        assert_eq!(confirmed.confirmation(), Confirmation::Confirmed);
    }

    #[test]
    fn error_toasts_expire_sooner() {
        let item = toast_item(Notice::error("Failed to load posts"));
        assert_eq!(item.kind, "error");
        assert_eq!(item.ttl_ms, 5000);
        assert!(!item.is_list());
    }
}
