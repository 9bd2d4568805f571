//! The signed-in user's profile.

use axum::{
    extract::{Form, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use datastar::prelude::ElementPatchMode;

use super::{
    AppState,
    context::SessionContext,
    selectors::{MODAL_SLOT, PROFILE_PANEL},
    shared::{DeleteForm, close_modal, finish_stream, render_fragment},
};
use crate::{
    application::{
        admin::{
            auth::LOGIN_PATH,
            profile::{PROFILE_PATH, ProfileForm, ProfileOutcome},
        },
        error::HttpError,
        resource::{DeleteOutcome, MODAL_CLOSE_PATH},
        stream::StreamBuilder,
        toasts::Notices,
    },
    presentation::{admin::views as admin_views, views::render_page},
};

pub(super) async fn profile_page(State(state): State<AppState>, ctx: SessionContext) -> Response {
    let chrome = state
        .chrome
        .load(&ctx.session.user(), ctx.theme, PROFILE_PATH);
    // Fields stay empty until the panel loads the stored profile.
    let content = state.profile.view(&ProfileForm::default(), false);
    let view = admin_views::AdminLayout::new(chrome, content);
    render_page(admin_views::AdminProfileTemplate { view }, StatusCode::OK)
}

pub(super) async fn profile_panel(State(state): State<AppState>, ctx: SessionContext) -> Response {
    let notices = Notices::new();
    let Some(form) = state.profile.load(&ctx.session, &notices).await else {
        return finish_stream(StreamBuilder::new(), &notices);
    };
    let mut stream = StreamBuilder::new();
    if let Err(err) = push_profile(&mut stream, &state, &form) {
        return err.into_response();
    }
    finish_stream(stream, &notices)
}

pub(super) async fn profile_update(
    State(state): State<AppState>,
    ctx: SessionContext,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Response {
    let notices = Notices::new();
    let form = match state.profile.update(&ctx.session, &notices, &pairs).await {
        ProfileOutcome::Saved(form) | ProfileOutcome::Rejected(form) => form,
    };
    let mut stream = StreamBuilder::new();
    if let Err(err) = push_profile(&mut stream, &state, &form) {
        return err.into_response();
    }
    finish_stream(stream, &notices)
}

/// Confirm, delete the account, end the session and leave for the sign-in page.
pub(super) async fn profile_delete(
    State(state): State<AppState>,
    ctx: SessionContext,
    jar: CookieJar,
    Form(form): Form<DeleteForm>,
) -> Response {
    let notices = Notices::new();
    let result = state
        .profile
        .delete_account(&ctx.session, &notices, form.confirmation())
        .await;

    let mut stream = StreamBuilder::new();
    match result {
        Ok(DeleteOutcome::ConfirmationRequired(message)) => {
            let html = match render_fragment(
                "infra::http::profile::confirm",
                admin_views::ConfirmDialogTemplate {
                    dialog: admin_views::ConfirmDialogView {
                        title: "Delete account".to_string(),
                        message,
                        confirm_action: format!("{PROFILE_PATH}/delete"),
                        confirm_label: "Delete my account".to_string(),
                        close_action: MODAL_CLOSE_PATH.to_string(),
                    },
                },
            ) {
                Ok(html) => html,
                Err(err) => return err.into_response(),
            };
            stream.push_patch(html, MODAL_SLOT, ElementPatchMode::Replace);
            finish_stream(stream, &notices)
        }
        Ok(DeleteOutcome::Deleted) => {
            state.sessions.remove(ctx.session.id());
            stream.push_redirect(&format!("{LOGIN_PATH}?notice=account-deleted"));
            let jar = jar.remove(Cookie::build(state.session_cookie.to_string()).path("/"));
            (jar, stream.into_response()).into_response()
        }
        Err(_) => {
            if let Err(err) = close_modal(&mut stream) {
                return err.into_response();
            }
            finish_stream(stream, &notices)
        }
    }
}

fn push_profile(
    stream: &mut StreamBuilder,
    state: &AppState,
    form: &ProfileForm,
) -> Result<(), HttpError> {
    let html = render_fragment(
        "infra::http::profile::panel",
        admin_views::AdminProfilePanelTemplate {
            content: state.profile.view(form, false),
        },
    )?;
    stream.push_patch(html, PROFILE_PANEL, ElementPatchMode::Replace);
    Ok(())
}
