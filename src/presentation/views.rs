//! Turning console templates into pages and datastar fragments.

use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

use crate::application::error::HttpError;

const RENDER_FAILED_MESSAGE: &str = "The page could not be rendered";

/// A console template that failed to render.
#[derive(Debug, Error)]
#[error("`{template}` failed to render for {origin}")]
pub struct PageRenderError {
    origin: &'static str,
    template: &'static str,
    #[source]
    source: askama::Error,
}

impl PageRenderError {
    /// Handler that asked for the render, used as the error report source.
    pub fn origin(&self) -> &'static str {
        self.origin
    }

    pub fn template(&self) -> &'static str {
        self.template
    }
}

impl From<PageRenderError> for HttpError {
    fn from(err: PageRenderError) -> Self {
        HttpError::from_error(
            err.origin,
            StatusCode::INTERNAL_SERVER_ERROR,
            RENDER_FAILED_MESSAGE,
            &err,
        )
    }
}

/// Render a template to a string for patching into the page.
pub fn render_fragment<T: Template>(
    origin: &'static str,
    template: &T,
) -> Result<String, PageRenderError> {
    template.render().map_err(|source| PageRenderError {
        origin,
        template: template_name::<T>(),
        source,
    })
}

/// Render a full console page with `status`, or a 500 when the template fails.
pub fn render_page<T: Template>(template: T, status: StatusCode) -> Response {
    match render_fragment("quire::presentation::page", &template) {
        Ok(html) => (status, Html(html)).into_response(),
        Err(err) => HttpError::from(err).into_response(),
    }
}

fn template_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

#[cfg(test)]
mod tests {
    use std::fmt;

    use super::*;

    #[derive(Template)]
    #[template(source = "<p>{{ name }}</p>", ext = "html")]
    struct Greeting {
        name: &'static str,
    }

    struct Unprintable;

    impl fmt::Display for Unprintable {
        fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
            Err(fmt::Error)
        }
    }

    #[derive(Template)]
    #[template(source = "<p>{{ value }}</p>", ext = "html")]
    struct Broken {
        value: Unprintable,
    }

    #[test]
    fn fragments_render_to_markup() {
        let html = render_fragment("tests", &Greeting { name: "Ada" }).expect("render");
        assert_eq!(html, "<p>Ada</p>");
    }

    #[test]
    fn failures_name_the_template_and_the_caller() {
        let err = render_fragment("quire::infra::http::posts", &Broken { value: Unprintable })
            .expect_err("display error");
        assert_eq!(err.template(), "Broken");
        assert_eq!(err.origin(), "quire::infra::http::posts");

        let response = render_page(Broken { value: Unprintable }, StatusCode::OK);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            render_page(Greeting { name: "Ada" }, StatusCode::CREATED).status(),
            StatusCode::CREATED
        );
    }
}
