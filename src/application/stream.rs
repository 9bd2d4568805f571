//! Datastar SSE responses assembled from a list of patches.

use std::convert::Infallible;

use async_stream::stream;
use axum::response::{
    IntoResponse, Response,
    sse::{Event, Sse},
};
use datastar::prelude::{ElementPatchMode, ExecuteScript, PatchElements};

/// Events sent back for one datastar request, in order.
#[derive(Default)]
pub struct StreamBuilder {
    events: Vec<Event>,
}

impl StreamBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Patch rendered HTML into the element matched by `selector`.
    pub fn push_patch(
        &mut self,
        html: String,
        selector: &str,
        mode: ElementPatchMode,
    ) -> &mut Self {
        let event = PatchElements::new(html)
            .selector(selector)
            .mode(mode)
            .write_as_axum_sse_event();
        self.events.push(event);
        self
    }

    /// Send the browser to `path`, e.g. after the session ended.
    pub fn push_redirect(&mut self, path: &str) -> &mut Self {
        let target = serde_json::to_string(path).unwrap_or_else(|_| "\"/\"".to_string());
        let event = ExecuteScript::new(format!("window.location.assign({target});"))
            .write_as_axum_sse_event();
        self.events.push(event);
        self
    }

    /// Swap the address bar to `path` without navigating.
    pub fn push_replace_url(&mut self, path: &str) -> &mut Self {
        let target = serde_json::to_string(path).unwrap_or_else(|_| "\"/\"".to_string());
        let script = format!("window.history.replaceState(null, \"\", {target});");
        let event = ExecuteScript::new(script).write_as_axum_sse_event();
        self.events.push(event);
        self
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn into_response(self) -> Response {
        let events = self.events;
        let stream = stream! {
            for event in events {
                yield Ok::<Event, Infallible>(event);
            }
        };
        Sse::new(stream).into_response()
    }
}
