//! Console stylesheet and other static files, embedded at compile time.

use axum::{
    body::Body,
    extract::Path,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use include_dir::{Dir, include_dir};

use crate::application::error::ErrorReport;

static ADMIN_ASSETS: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/static/admin");

const SOURCE: &str = "infra::assets::serve_admin";

pub async fn serve_admin(Path(path): Path<String>) -> Response {
    match lookup(&path) {
        Some((contents, mime)) => asset_response(contents, mime),
        None => {
            let mut response = StatusCode::NOT_FOUND.into_response();
            ErrorReport::from_message(SOURCE, StatusCode::NOT_FOUND, "Static asset not found")
                .attach(&mut response);
            response
        }
    }
}

/// Resolve a request path inside the bundle. Directories and `..` never match.
fn lookup(path: &str) -> Option<(&'static [u8], mime_guess::Mime)> {
    let candidate = path.trim_start_matches('/');
    if candidate.is_empty() || candidate.ends_with('/') || candidate.contains("..") {
        return None;
    }
    let file = ADMIN_ASSETS.get_file(candidate)?;
    Some((
        file.contents(),
        mime_guess::from_path(candidate).first_or_octet_stream(),
    ))
}

fn asset_response(contents: &'static [u8], mime: mime_guess::Mime) -> Response {
    let mut response = Response::new(Body::from(Bytes::from_static(contents)));
    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(mime.as_ref()) {
        headers.insert(header::CONTENT_TYPE, value);
    }
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(contents.len()));
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("public, max-age=86400"),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stylesheet_is_embedded() {
        let (_, mime) = lookup("admin.css").expect("stylesheet");
        assert_eq!(mime.essence_str(), "text/css");
    }

    #[test]
    fn traversal_is_refused() {
        assert!(lookup("../Cargo.toml").is_none());
        assert!(lookup("").is_none());
    }
}
