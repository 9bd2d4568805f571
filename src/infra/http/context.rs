//! Per-request session and theme, read from cookies.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use metrics::gauge;

use super::{AppState, METRIC_SESSIONS_ACTIVE};
use crate::{
    application::{admin::auth::LOGIN_PATH, error::AppError, session::Session, stream::StreamBuilder},
    domain::session::{DashboardKind, Theme},
};

pub const THEME_COOKIE: &str = "quire_theme";
const DATASTAR_REQUEST_HEADER: &str = "datastar-request";

/// The signed-in session behind a request.
pub struct SessionContext {
    pub session: Arc<Session>,
    pub theme: Theme,
}

impl SessionContext {
    /// Refuse the request unless the account's role opens `section`.
    pub fn require(&self, section: DashboardKind) -> Result<(), AppError> {
        let user = self.session.user();
        if user.dashboard() == section {
            Ok(())
        } else {
            Err(AppError::forbidden(user.role_name.as_deref()))
        }
    }
}

impl FromRequestParts<AppState> for SessionContext {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let theme = theme_from(&jar);
        let session = jar
            .get(&state.session_cookie)
            .and_then(|cookie| state.sessions.get(cookie.value()));
        gauge!(METRIC_SESSIONS_ACTIVE).set(state.sessions.len() as f64);

        match session {
            Some(session) => Ok(Self { session, theme }),
            None => Err(sign_in_redirect(&parts.headers)),
        }
    }
}

/// Theme preference for pages that do not need a session.
pub struct ThemePreference(pub Theme);

impl<S: Send + Sync> FromRequestParts<S> for ThemePreference {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(theme_from(&CookieJar::from_headers(&parts.headers))))
    }
}

fn theme_from(jar: &CookieJar) -> Theme {
    jar.get(THEME_COOKIE)
        .and_then(|cookie| Theme::parse(cookie.value()))
        .unwrap_or_default()
}

pub fn is_datastar_request(headers: &HeaderMap) -> bool {
    headers.contains_key(DATASTAR_REQUEST_HEADER)
}

/// Send an anonymous visitor to the sign-in page, via script for datastar requests.
pub fn sign_in_redirect(headers: &HeaderMap) -> Response {
    redirect(headers, LOGIN_PATH)
}

pub fn redirect(headers: &HeaderMap, path: &str) -> Response {
    if is_datastar_request(headers) {
        let mut stream = StreamBuilder::new();
        stream.push_redirect(path);
        stream.into_response()
    } else {
        Redirect::to(path).into_response()
    }
}

pub fn session_cookie(name: &str, value: String) -> Cookie<'static> {
    Cookie::build((name.to_string(), value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

pub fn theme_cookie(theme: Theme) -> Cookie<'static> {
    Cookie::build((THEME_COOKIE, theme.as_str()))
        .path("/")
        .same_site(SameSite::Lax)
        .permanent()
        .build()
}
