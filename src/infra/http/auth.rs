//! Sign-in, registration and sign-out pages.

use axum::{
    extract::{Form, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::Deserialize;

use super::{
    AppState,
    context::{SessionContext, ThemePreference, redirect, session_cookie},
};
use crate::{
    application::{
        admin::{
            auth::{AuthForm, LOGIN_PATH},
            profile::ACCOUNT_DELETED_MESSAGE,
        },
        session::Session,
    },
    presentation::{admin::views as admin_views, views::render_page},
};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct LoginQuery {
    notice: Option<String>,
}

fn notice_text(key: Option<&str>) -> Option<String> {
    match key {
        Some("account-deleted") => Some(ACCOUNT_DELETED_MESSAGE.to_string()),
        _ => None,
    }
}

pub(super) async fn login_page(
    State(state): State<AppState>,
    ThemePreference(theme): ThemePreference,
    Query(query): Query<LoginQuery>,
) -> Response {
    let content = state
        .auth
        .login_view(&AuthForm::default(), notice_text(query.notice.as_deref()));
    let chrome = state.chrome.anonymous("Sign in", theme);
    let view = admin_views::AdminLayout::new(chrome, content);
    render_page(admin_views::AdminAuthTemplate { view }, StatusCode::OK)
}

pub(super) async fn login_submit(
    State(state): State<AppState>,
    ThemePreference(theme): ThemePreference,
    jar: CookieJar,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Response {
    match state.auth.login(&pairs).await {
        Ok(session) => signed_in(&state, jar, &session),
        Err(form) => {
            let content = state.auth.login_view(&form, None);
            let chrome = state.chrome.anonymous("Sign in", theme);
            let view = admin_views::AdminLayout::new(chrome, content);
            render_page(
                admin_views::AdminAuthTemplate { view },
                StatusCode::UNPROCESSABLE_ENTITY,
            )
        }
    }
}

pub(super) async fn register_page(
    State(state): State<AppState>,
    ThemePreference(theme): ThemePreference,
) -> Response {
    let content = state.auth.register_view(&AuthForm::default());
    let chrome = state.chrome.anonymous("Register", theme);
    let view = admin_views::AdminLayout::new(chrome, content);
    render_page(admin_views::AdminAuthTemplate { view }, StatusCode::OK)
}

pub(super) async fn register_submit(
    State(state): State<AppState>,
    ThemePreference(theme): ThemePreference,
    jar: CookieJar,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Response {
    match state.auth.register(&pairs).await {
        Ok(session) => signed_in(&state, jar, &session),
        Err(form) => {
            let content = state.auth.register_view(&form);
            let chrome = state.chrome.anonymous("Register", theme);
            let view = admin_views::AdminLayout::new(chrome, content);
            render_page(
                admin_views::AdminAuthTemplate { view },
                StatusCode::UNPROCESSABLE_ENTITY,
            )
        }
    }
}

pub(super) async fn logout(
    State(state): State<AppState>,
    ctx: SessionContext,
    headers: HeaderMap,
    jar: CookieJar,
) -> Response {
    state.auth.logout(&ctx.session).await;
    let jar = jar.remove(Cookie::build(state.session_cookie.to_string()).path("/"));
    (jar, redirect(&headers, LOGIN_PATH)).into_response()
}

fn signed_in(state: &AppState, jar: CookieJar, session: &Session) -> Response {
    let jar = jar.add(session_cookie(
        &state.session_cookie,
        session.id().to_string(),
    ));
    (jar, Redirect::to("/")).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_known_notices_are_shown() {
        assert_eq!(
            notice_text(Some("account-deleted")).as_deref(),
            Some(ACCOUNT_DELETED_MESSAGE)
        );
        assert_eq!(notice_text(Some("<script>")), None);
        assert_eq!(notice_text(None), None);
    }
}
