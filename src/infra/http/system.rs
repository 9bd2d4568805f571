use axum::{
    extract::State,
    http::{
        HeaderMap, StatusCode,
        header::{CACHE_CONTROL, REFERER},
    },
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;

use super::{
    AppState,
    context::{SessionContext, ThemePreference, theme_cookie},
    shared::close_modal,
};
use crate::{
    application::stream::StreamBuilder,
    presentation::{admin::views as admin_views, views::render_page},
};

pub(super) async fn health() -> Response {
    (StatusCode::NO_CONTENT, [(CACHE_CONTROL, "no-store")]).into_response()
}

pub(super) async fn home(State(state): State<AppState>, ctx: SessionContext) -> Response {
    let user = ctx.session.user();
    let chrome = state.chrome.load(&user, ctx.theme, "/");
    let content = state.dashboard.home(&user);
    let view = admin_views::AdminLayout::new(chrome, content);
    render_page(admin_views::AdminHomeTemplate { view }, StatusCode::OK)
}

/// Flip the theme cookie and go back where the toggle was pressed.
pub(super) async fn toggle_theme(
    ThemePreference(theme): ThemePreference,
    headers: HeaderMap,
    jar: CookieJar,
) -> Response {
    let back = headers
        .get(REFERER)
        .and_then(|value| value.to_str().ok())
        .and_then(same_site_path)
        .unwrap_or("/")
        .to_string();
    let jar = jar.add(theme_cookie(theme.toggled()));
    (jar, Redirect::to(&back)).into_response()
}

pub(super) async fn close_modal_slot() -> Response {
    let mut stream = StreamBuilder::new();
    if let Err(err) = close_modal(&mut stream) {
        return err.into_response();
    }
    stream.into_response()
}

/// The path of a referer, so a redirect never leaves the console.
fn same_site_path(referer: &str) -> Option<&str> {
    let rest = referer
        .strip_prefix("http://")
        .or_else(|| referer.strip_prefix("https://"))?;
    let path = &rest[rest.find('/')?..];
    (!path.starts_with("//")).then_some(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn referers_reduce_to_their_path() {
        assert_eq!(
            same_site_path("http://localhost:3000/users?x=1"),
            Some("/users?x=1")
        );
        assert_eq!(same_site_path("https://console.example"), None);
        assert_eq!(same_site_path("javascript:alert(1)"), None);
        assert_eq!(same_site_path("https://host//evil.example"), None);
    }
}
