//! User-facing notices and the mapping from API error envelopes onto them.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use quire_api_types::ApiErrorBody;
use serde_json::Value;

use super::repos::RepoError;

pub const ERROR_TOAST_HEADING: &str = "There were some errors:";
const UNKNOWN_ENTRY_MESSAGE: &str = "Unknown error";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// One toast worth of feedback. Error notices with several lines render as a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub heading: Option<&'static str>,
    pub lines: Vec<String>,
}

impl Notice {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            heading: None,
            lines: vec![text.into()],
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            heading: None,
            lines: vec![text.into()],
        }
    }

    /// The aggregated error toast for a failed API call.
    pub fn from_repo_error(err: &RepoError) -> Self {
        Self {
            kind: NoticeKind::Error,
            heading: Some(ERROR_TOAST_HEADING),
            lines: err.toast_messages(),
        }
    }
}

/// Notices raised while handling one request, drained by the HTTP layer.
#[derive(Debug, Clone, Default)]
pub struct Notices {
    inner: Arc<Mutex<Vec<Notice>>>,
}

impl Notices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, notice: Notice) {
        match self.inner.lock() {
            Ok(mut notices) => notices.push(notice),
            Err(poisoned) => poisoned.into_inner().push(notice),
        }
    }

    pub fn success(&self, text: impl Into<String>) {
        self.push(Notice::success(text));
    }

    pub fn error(&self, text: impl Into<String>) {
        self.push(Notice::error(text));
    }

    pub fn repo_error(&self, err: &RepoError) {
        self.push(Notice::from_repo_error(err));
    }

    pub fn drain(&self) -> Vec<Notice> {
        match self.inner.lock() {
            Ok(mut notices) => std::mem::take(&mut *notices),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

/// Classify a non-2xx API response.
///
/// An `errors` array becomes one message per entry (`msg`, `message`, `error`,
/// else "Unknown error"). An `errors` object keyed by field name becomes
/// [`RepoError::FieldErrors`]. Otherwise the top-level `message` is used.
pub fn classify_error_response(status: u16, body: Option<ApiErrorBody>) -> RepoError {
    let body = body.unwrap_or_default();

    match body.errors {
        Some(Value::Array(entries)) if !entries.is_empty() => {
            let messages = entries.iter().map(entry_message).collect();
            return RepoError::Rejected { status, messages };
        }
        Some(Value::Object(map)) if !map.is_empty() => {
            let fields: BTreeMap<String, String> = map
                .into_iter()
                .map(|(field, value)| {
                    let message = match value {
                        Value::String(text) => text,
                        other => entry_message(&other),
                    };
                    (field, message)
                })
                .collect();
            return RepoError::FieldErrors(fields);
        }
        _ => {}
    }

    if let Some(message) = body.message.filter(|message| !message.trim().is_empty()) {
        return RepoError::Rejected {
            status,
            messages: vec![message],
        };
    }

    match status {
        401 => RepoError::Unauthorized,
        404 => RepoError::NotFound,
        _ => RepoError::Rejected {
            status,
            messages: Vec::new(),
        },
    }
}

fn entry_message(entry: &Value) -> String {
    ["msg", "message", "error"]
        .iter()
        .find_map(|key| {
            entry
                .get(key)
                .and_then(Value::as_str)
                .filter(|text| !text.is_empty())
        })
        .unwrap_or(UNKNOWN_ENTRY_MESSAGE)
        .to_string()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn body(value: Value) -> Option<ApiErrorBody> {
        Some(serde_json::from_value(value).expect("error body"))
    }

    #[test]
    fn error_arrays_yield_one_line_per_entry() {
        let err = classify_error_response(
            400,
            body(json!({
                "errors": [
                    {"msg": "Email is invalid"},
                    {"message": "Username taken"},
                    {"error": "Too short"},
                    {"code": 7}
                ]
            })),
        );
        assert_eq!(
            err.toast_messages(),
            vec![
                "Email is invalid",
                "Username taken",
                "Too short",
                "Unknown error"
            ]
        );
    }

    #[test]
    fn error_objects_map_onto_fields() {
        let err = classify_error_response(422, body(json!({"errors": {"name": "Already exists"}})));
        let fields = err.field_errors().expect("field errors");
        assert_eq!(fields.get("name").map(String::as_str), Some("Already exists"));
    }

    #[test]
    fn message_is_used_without_errors() {
        let err = classify_error_response(409, body(json!({"message": "Role in use"})));
        assert_eq!(err.toast_messages(), vec!["Role in use"]);
    }

    #[test]
    fn notices_drain_in_order() {
        let notices = Notices::new();
        let shared = notices.clone();
        shared.success("Saved");
        shared.repo_error(&RepoError::transport("timeout"));

        let drained = notices.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0], Notice::success("Saved"));
        assert_eq!(drained[1].heading, Some(ERROR_TOAST_HEADING));
        assert_eq!(drained[1].lines, vec!["An unexpected error occurred"]);
        assert!(notices.drain().is_empty());
    }

    #[test]
    fn bare_statuses_are_classified() {
        assert!(matches!(
            classify_error_response(401, None),
            RepoError::Unauthorized
        ));
        assert!(matches!(
            classify_error_response(404, None),
            RepoError::NotFound
        ));
        assert!(matches!(
            classify_error_response(500, None),
            RepoError::Rejected { status: 500, .. }
        ));
    }
}
