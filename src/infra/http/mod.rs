//! Console HTTP surface: pages, datastar actions and static assets.

mod access;
mod auth;
mod context;
mod middleware;
mod posts;
mod profile;
mod resources;
mod selectors;
mod shared;
mod state;
mod system;
mod users;

pub use context::{SessionContext, THEME_COOKIE};
pub use middleware::RequestContext;
pub use state::AppState;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::from_fn,
    routing::{get, post},
};

use crate::{application::resource::MODAL_CLOSE_PATH, infra::assets};

pub const METRIC_SESSIONS_ACTIVE: &str = "quire_sessions_active";

pub fn build_router(state: AppState) -> Router {
    let upload_limit = usize::try_from(state.upload_limit_bytes).unwrap_or(usize::MAX);

    Router::new()
        .route("/", get(system::home))
        .route("/_health", get(system::health))
        .route("/theme", post(system::toggle_theme))
        .route(MODAL_CLOSE_PATH, get(system::close_modal_slot))
        .route("/login", get(auth::login_page).post(auth::login_submit))
        .route(
            "/register",
            get(auth::register_page).post(auth::register_submit),
        )
        .route("/logout", post(auth::logout))
        .route("/access", get(access::access_page))
        .route("/access/panel", get(access::access_panel))
        .route("/access/roles", post(access::role_create))
        .route("/access/roles/new", get(access::role_new))
        .route("/access/roles/{id}", post(access::role_update))
        .route("/access/roles/{id}/edit", get(access::role_edit))
        .route("/access/roles/{id}/delete", post(access::role_delete))
        .route("/access/permissions", post(access::permission_create))
        .route("/access/permissions/new", get(access::permission_new))
        .route("/access/permissions/{id}", post(access::permission_update))
        .route(
            "/access/permissions/{id}/edit",
            get(access::permission_edit),
        )
        .route(
            "/access/permissions/{id}/delete",
            post(access::permission_delete),
        )
        .route("/users", get(users::users_page).post(users::user_create))
        .route("/users/panel", get(users::users_panel))
        .route("/users/new", get(users::user_new))
        .route("/users/{id}", post(users::user_update))
        .route("/users/{id}/edit", get(users::user_edit))
        .route("/users/{id}/delete", post(users::user_delete))
        .route("/posts", get(posts::posts_page))
        .route("/posts/panel", get(posts::posts_panel))
        .route("/posts/new", get(posts::post_new))
        .route("/posts/{id}/edit", get(posts::post_edit))
        .route("/posts/{id}/delete", post(posts::post_delete))
        .route("/posts/drafts/{draft}", get(posts::draft_page))
        .route("/posts/drafts/{draft}/title", post(posts::draft_title))
        .route(
            "/posts/drafts/{draft}/paragraphs",
            post(posts::draft_add_paragraph),
        )
        .route(
            "/posts/drafts/{draft}/images",
            post(posts::draft_add_image).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/posts/drafts/{draft}/images/{block}",
            get(posts::draft_image_preview),
        )
        .route(
            "/posts/drafts/{draft}/blocks/{block}/text",
            post(posts::draft_update_paragraph),
        )
        .route(
            "/posts/drafts/{draft}/blocks/{block}/image",
            post(posts::draft_replace_image).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/posts/drafts/{draft}/blocks/{block}/remove",
            post(posts::draft_remove_block),
        )
        .route("/posts/drafts/{draft}/save", post(posts::draft_save))
        .route("/posts/drafts/{draft}/publish", post(posts::draft_publish))
        .route("/posts/drafts/{draft}/discard", post(posts::draft_discard))
        .route(
            "/profile",
            get(profile::profile_page).post(profile::profile_update),
        )
        .route("/profile/panel", get(profile::profile_panel))
        .route("/profile/delete", post(profile::profile_delete))
        .route("/static/admin/{*path}", get(assets::serve_admin))
        .with_state(state)
        .layer(from_fn(middleware::log_responses))
        .layer(from_fn(middleware::set_request_context))
}
