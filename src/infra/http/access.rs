//! Roles and permissions pages.

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

pub(super) async fn access_page(State(state): State<AppState>, ctx: SessionContext) -> Response {
    if let Err(err) = ctx.require(DashboardKind::Admin) {
        return err.into_response();
    }
    let chrome = state
        .chrome
        .load(&ctx.session.user(), ctx.theme, "/access");
    let content = state.access.page_view(&ctx.session, &Notices::new());
    let view = admin_views::AdminLayout::new(chrome, content);
    render_page(admin_views::ResourcePageTemplate { view }, StatusCode::OK)
}

pub(super) async fn access_panel(State(state): State<AppState>, ctx: SessionContext) -> Response {
    if let Err(err) = ctx.require(DashboardKind::Admin) {
        return err.into_response();
    }
    let notices = Notices::new();
    state.access.load(&ctx.session, &notices).await;

    let mut stream = StreamBuilder::new();
    let roles = state.access.roles_manager(&ctx.session, &notices);
    let permissions = state.access.permissions_manager(&ctx.session, &notices);
    if let Err(err) =
        push_panel(&mut stream, &roles).and_then(|()| push_panel(&mut stream, &permissions))
    {
        return err.into_response();
    }
    finish_stream(stream, &notices)
}

pub(super) async fn role_new(State(state): State<AppState>, ctx: SessionContext) -> Response {
    if let Err(err) = ctx.require(DashboardKind::Admin) {
        return err.into_response();
    }
    let manager = state.access.roles_manager(&ctx.session, &Notices::new());
    open_form(&manager, FormMode::Create)
}

pub(super) async fn role_edit(
    State(state): State<AppState>,
    ctx: SessionContext,
    Path(id): Path<String>,
) -> Response {
    if let Err(err) = ctx.require(DashboardKind::Admin) {
        return err.into_response();
    }
    let manager = state.access.roles_manager(&ctx.session, &Notices::new());
    open_form(&manager, FormMode::Edit { id })
}

pub(super) async fn role_create(
    State(state): State<AppState>,
    ctx: SessionContext,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Response {
    if let Err(err) = ctx.require(DashboardKind::Admin) {
        return err.into_response();
    }
    let notices = Notices::new();
    let manager = state.access.roles_manager(&ctx.session, &notices);
    submit_form(&manager, FormMode::Create, pairs, &notices).await
}

pub(super) async fn role_update(
    State(state): State<AppState>,
    ctx: SessionContext,
    Path(id): Path<String>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Response {
    if let Err(err) = ctx.require(DashboardKind::Admin) {
        return err.into_response();
    }
    let notices = Notices::new();
    let manager = state.access.roles_manager(&ctx.session, &notices);
    submit_form(&manager, FormMode::Edit { id }, pairs, &notices).await
}

pub(super) async fn role_delete(
    State(state): State<AppState>,
    ctx: SessionContext,
    Path(id): Path<String>,
    Form(form): Form<DeleteForm>,
) -> Response {
    if let Err(err) = ctx.require(DashboardKind::Admin) {
        return err.into_response();
    }
    let notices = Notices::new();
    let manager = state.access.roles_manager(&ctx.session, &notices);
    delete_item(&manager, &id, form.confirmation(), &notices).await
}

pub(super) async fn permission_new(State(state): State<AppState>, ctx: SessionContext) -> Response {
    if let Err(err) = ctx.require(DashboardKind::Admin) {
        return err.into_response();
    }
    let manager = state
        .access
        .permissions_manager(&ctx.session, &Notices::new());
    open_form(&manager, FormMode::Create)
}

pub(super) async fn permission_edit(
    State(state): State<AppState>,
    ctx: SessionContext,
    Path(id): Path<String>,
) -> Response {
    if let Err(err) = ctx.require(DashboardKind::Admin) {
        return err.into_response();
    }
    let manager = state
        .access
        .permissions_manager(&ctx.session, &Notices::new());
    open_form(&manager, FormMode::Edit { id })
}

pub(super) async fn permission_create(
    State(state): State<AppState>,
    ctx: SessionContext,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Response {
    if let Err(err) = ctx.require(DashboardKind::Admin) {
        return err.into_response();
    }
    let notices = Notices::new();
    let manager = state.access.permissions_manager(&ctx.session, &notices);
    submit_form(&manager, FormMode::Create, pairs, &notices).await
}

pub(super) async fn permission_update(
    State(state): State<AppState>,
    ctx: SessionContext,
    Path(id): Path<String>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Response {
    if let Err(err) = ctx.require(DashboardKind::Admin) {
        return err.into_response();
    }
    let notices = Notices::new();
    let manager = state.access.permissions_manager(&ctx.session, &notices);
    submit_form(&manager, FormMode::Edit { id }, pairs, &notices).await
}

pub(super) async fn permission_delete(
    State(state): State<AppState>,
    ctx: SessionContext,
    Path(id): Path<String>,
    Form(form): Form<DeleteForm>,
) -> Response {
    if let Err(err) = ctx.require(DashboardKind::Admin) {
        return err.into_response();
    }
    let notices = Notices::new();
    let manager = state.access.permissions_manager(&ctx.session, &notices);
    delete_item(&manager, &id, form.confirmation(), &notices).await
}
