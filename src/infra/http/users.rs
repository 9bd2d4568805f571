//! User administration page.

use axum::{
    extract::{Form, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::{
    AppState,
    context::SessionContext,
    resources::{delete_item, open_form, push_panel, submit_form},
    shared::{DeleteForm, finish_stream},
};
use crate::{
    application::{resource::FormMode, stream::StreamBuilder, toasts::Notices},
    domain::session::DashboardKind,
    presentation::{admin::views as admin_views, views::render_page},
};

pub(super) async fn users_page(State(state): State<AppState>, ctx: SessionContext) -> Response {
    if let Err(err) = ctx.require(DashboardKind::Admin) {
        return err.into_response();
    }
    let chrome = state.chrome.load(&ctx.session.user(), ctx.theme, "/users");
    let content = state.users.page_view(&ctx.session, &Notices::new());
    let view = admin_views::AdminLayout::new(chrome, content);
    render_page(admin_views::ResourcePageTemplate { view }, StatusCode::OK)
}

pub(super) async fn users_panel(State(state): State<AppState>, ctx: SessionContext) -> Response {
    if let Err(err) = ctx.require(DashboardKind::Admin) {
        return err.into_response();
    }
    let notices = Notices::new();
    state.users.load(&ctx.session, &notices).await;

    let mut stream = StreamBuilder::new();
    let manager = state.users.manager(&ctx.session, &notices);
    if let Err(err) = push_panel(&mut stream, &manager) {
        return err.into_response();
    }
    finish_stream(stream, &notices)
}

pub(super) async fn user_new(State(state): State<AppState>, ctx: SessionContext) -> Response {
    if let Err(err) = ctx.require(DashboardKind::Admin) {
        return err.into_response();
    }
    let manager = state.users.manager(&ctx.session, &Notices::new());
    open_form(&manager, FormMode::Create)
}

pub(super) async fn user_edit(
    State(state): State<AppState>,
    ctx: SessionContext,
    Path(id): Path<String>,
) -> Response {
    if let Err(err) = ctx.require(DashboardKind::Admin) {
        return err.into_response();
    }
    let manager = state.users.manager(&ctx.session, &Notices::new());
    open_form(&manager, FormMode::Edit { id })
}

pub(super) async fn user_create(
    State(state): State<AppState>,
    ctx: SessionContext,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Response {
    if let Err(err) = ctx.require(DashboardKind::Admin) {
        return err.into_response();
    }
    let notices = Notices::new();
    let manager = state.users.manager(&ctx.session, &notices);
    submit_form(&manager, FormMode::Create, pairs, &notices).await
}

pub(super) async fn user_update(
    State(state): State<AppState>,
    ctx: SessionContext,
    Path(id): Path<String>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Response {
    if let Err(err) = ctx.require(DashboardKind::Admin) {
        return err.into_response();
    }
    let notices = Notices::new();
    let manager = state.users.manager(&ctx.session, &notices);
    submit_form(&manager, FormMode::Edit { id }, pairs, &notices).await
}

pub(super) async fn user_delete(
    State(state): State<AppState>,
    ctx: SessionContext,
    Path(id): Path<String>,
    Form(form): Form<DeleteForm>,
) -> Response {
    if let Err(err) = ctx.require(DashboardKind::Admin) {
        return err.into_response();
    }
    let notices = Notices::new();
    let manager = state.users.manager(&ctx.session, &notices);
    delete_item(&manager, &id, form.confirmation(), &notices).await
}
