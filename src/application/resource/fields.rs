//! Declarative form field schema, submitted values, and client-side validation.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use regex::Regex;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Email,
    Number,
    Textarea,
    Select,
    Password,
    CheckboxGroup,
}

impl FieldKind {
    /// `type` attribute for kinds rendered as a plain `<input>`.
    pub fn input_type(self) -> &'static str {
        match self {
            FieldKind::Email => "email",
            FieldKind::Number => "number",
            FieldKind::Password => "password",
            FieldKind::Text | FieldKind::Textarea | FieldKind::Select | FieldKind::CheckboxGroup => {
                "text"
            }
        }
    }

    pub fn is_multi(self) -> bool {
        matches!(self, FieldKind::CheckboxGroup)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldOption {
    pub value: String,
    pub label: String,
}

impl FieldOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// A submitted value: a single string, or a list for checkbox groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(text) => text.is_empty(),
            FieldValue::List(items) => items.is_empty(),
        }
    }

    /// Character count for text, item count for lists.
    pub fn len(&self) -> usize {
        match self {
            FieldValue::Text(text) => text.chars().count(),
            FieldValue::List(items) => items.len(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text.as_str()),
            FieldValue::List(_) => None,
        }
    }

    pub fn as_list(&self) -> &[String] {
        match self {
            FieldValue::List(items) => items.as_slice(),
            FieldValue::Text(_) => &[],
        }
    }

    fn to_json(&self) -> Value {
        match self {
            FieldValue::Text(text) => Value::String(text.clone()),
            FieldValue::List(items) => {
                Value::Array(items.iter().cloned().map(Value::String).collect())
            }
        }
    }
}

/// Form values keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormValues {
    values: BTreeMap<String, FieldValue>,
}

impl FormValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Group raw `name=value` pairs according to the schema.
    ///
    /// Checkbox-group fields collect every occurrence; other fields keep the last one.
    /// Pairs for names outside the schema are ignored.
    pub fn from_pairs(fields: &[Field], pairs: &[(String, String)]) -> Self {
        let mut values = Self::new();
        for field in fields {
            if field.kind.is_multi() {
                let items = pairs
                    .iter()
                    .filter(|(name, _)| *name == field.name)
                    .map(|(_, value)| value.clone())
                    .collect();
                values.set(field.name, FieldValue::List(items));
            } else if let Some((_, value)) = pairs.iter().rev().find(|(name, _)| *name == field.name) {
                values.set(field.name, FieldValue::Text(value.clone()));
            }
        }
        values
    }

    /// Initial values for an edit form, read from an item's JSON after [`preprocess_item`].
    pub fn from_item(item: &Value, fields: &[Field]) -> Self {
        let processed = preprocess_item(item, fields);
        let mut values = Self::new();
        for field in fields {
            let Some(raw) = processed.get(field.name) else {
                continue;
            };
            let value = if field.kind.is_multi() {
                let items = match raw {
                    Value::Array(entries) => entries.iter().filter_map(scalar_to_string).collect(),
                    _ => Vec::new(),
                };
                FieldValue::List(items)
            } else {
                match scalar_to_string(raw) {
                    Some(text) => FieldValue::Text(text),
                    None => continue,
                }
            };
            values.set(field.name, value);
        }
        values
    }

    pub fn set(&mut self, name: impl Into<String>, value: FieldValue) {
        self.values.insert(name.into(), value);
    }

    pub fn set_text(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.set(name, FieldValue::Text(value.into()));
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    /// Text value of `name`; empty when absent or a list.
    pub fn text(&self, name: &str) -> &str {
        self.values
            .get(name)
            .and_then(FieldValue::as_text)
            .unwrap_or("")
    }

    pub fn list(&self, name: &str) -> &[String] {
        self.values.get(name).map(FieldValue::as_list).unwrap_or(&[])
    }

    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        self.values.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .values
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect();
        Value::Object(map)
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

/// Cross-field check: receives the field's value and every submitted value.
pub type Validator = Arc<dyn Fn(&FieldValue, &FormValues) -> Result<(), String> + Send + Sync>;

#[derive(Clone, Default)]
pub struct FieldRules {
    pub required: bool,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub pattern: Option<Regex>,
    pub validate: Option<Validator>,
}

impl FieldRules {
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn min_length(mut self, limit: usize) -> Self {
        self.min_length = Some(limit);
        self
    }

    pub fn max_length(mut self, limit: usize) -> Self {
        self.max_length = Some(limit);
        self
    }

    pub fn pattern(mut self, pattern: Regex) -> Self {
        self.pattern = Some(pattern);
        self
    }

    pub fn validate<F>(mut self, check: F) -> Self
    where
        F: Fn(&FieldValue, &FormValues) -> Result<(), String> + Send + Sync + 'static,
    {
        self.validate = Some(Arc::new(check));
        self
    }
}

impl fmt::Debug for FieldRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldRules")
            .field("required", &self.required)
            .field("min_length", &self.min_length)
            .field("max_length", &self.max_length)
            .field("pattern", &self.pattern.as_ref().map(Regex::as_str))
            .field("validate", &self.validate.is_some())
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Field {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub rules: FieldRules,
    pub options: Vec<FieldOption>,
    pub placeholder: Option<String>,
}

impl Field {
    pub fn new(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            label,
            kind,
            rules: FieldRules::default(),
            options: Vec::new(),
            placeholder: None,
        }
    }

    pub fn rules(mut self, rules: FieldRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn options(mut self, options: Vec<FieldOption>) -> Self {
        self.options = options;
        self
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    /// First failing rule, checked in the order required, minimum length,
    /// maximum length, pattern, validator. Length and pattern rules only apply to
    /// non-empty values.
    pub fn check(&self, values: &FormValues) -> Option<FieldError> {
        let empty = FieldValue::Text(String::new());
        let value = values.get(self.name).unwrap_or(&empty);
        let rules = &self.rules;

        if rules.required && value.is_empty() {
            return Some(FieldError::new(FieldErrorKind::Required));
        }

        if !value.is_empty() {
            if let Some(limit) = rules.min_length
                && value.len() < limit
            {
                return Some(FieldError::new(FieldErrorKind::MinLength(limit)));
            }
            if let Some(limit) = rules.max_length
                && value.len() > limit
            {
                return Some(FieldError::new(FieldErrorKind::MaxLength(limit)));
            }
            if let (Some(pattern), Some(text)) = (rules.pattern.as_ref(), value.as_text())
                && !pattern.is_match(text)
            {
                return Some(FieldError::new(FieldErrorKind::Pattern));
            }
        }

        if let Some(check) = rules.validate.as_ref()
            && let Err(message) = check(value, values)
        {
            return Some(FieldError::with_message(FieldErrorKind::Validate, message));
        }

        None
    }
}

/// Which rule a value failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldErrorKind {
    Required,
    MinLength(usize),
    MaxLength(usize),
    Pattern,
    Validate,
    Server,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub kind: FieldErrorKind,
    pub message: Option<String>,
}

impl FieldError {
    pub fn new(kind: FieldErrorKind) -> Self {
        Self {
            kind,
            message: None,
        }
    }

    pub fn with_message(kind: FieldErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: Some(message.into()),
        }
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::with_message(FieldErrorKind::Server, message)
    }

    /// Message shown under the field.
    pub fn humanized(&self) -> String {
        match self.kind {
            FieldErrorKind::Required => "This field is required.".to_string(),
            FieldErrorKind::MinLength(limit) => {
                format!("Must be at least {limit} characters long.")
            }
            FieldErrorKind::MaxLength(limit) => format!("Cannot exceed {limit} characters."),
            FieldErrorKind::Pattern => "Invalid format.".to_string(),
            FieldErrorKind::Validate => self
                .message
                .clone()
                .filter(|message| !message.is_empty())
                .unwrap_or_else(|| "Validation error.".to_string()),
            FieldErrorKind::Server => self
                .message
                .clone()
                .filter(|message| !message.is_empty())
                .unwrap_or_else(|| "Invalid data.".to_string()),
        }
    }
}

/// Validate every field, keeping the first failure per field.
pub fn validate_form(fields: &[Field], values: &FormValues) -> BTreeMap<String, FieldError> {
    fields
        .iter()
        .filter_map(|field| {
            field
                .check(values)
                .map(|error| (field.name.to_string(), error))
        })
        .collect()
}

/// Normalize an item before it seeds an edit form: a checkbox-group value that is a
/// list of objects carrying `id` becomes the list of those ids.
pub fn preprocess_item(item: &Value, fields: &[Field]) -> Value {
    let Value::Object(map) = item else {
        return Value::Object(Map::new());
    };

    let mut processed = map.clone();
    for field in fields.iter().filter(|field| field.kind.is_multi()) {
        let Some(Value::Array(entries)) = map.get(field.name) else {
            continue;
        };
        let first_is_identified = entries
            .first()
            .and_then(Value::as_object)
            .is_some_and(|object| object.contains_key("id"));
        if first_is_identified {
            let ids = entries
                .iter()
                .filter_map(|entry| entry.get("id").cloned())
                .collect();
            processed.insert(field.name.to_string(), Value::Array(ids));
        }
    }
    Value::Object(processed)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn permission_name() -> Field {
        Field::new("name", "Permission key", FieldKind::Text).rules(
            FieldRules::default()
                .required()
                .pattern(Regex::new(r"^[A-Z0-9_:]+$").expect("regex")),
        )
    }

    fn values(pairs: &[(&str, &str)]) -> FormValues {
        let mut values = FormValues::new();
        for (name, value) in pairs {
            values.set_text(*name, *value);
        }
        values
    }

    #[test]
    fn required_field_without_value_fails_first() {
        let error = permission_name().check(&FormValues::new()).expect("error");
        assert_eq!(error.kind, FieldErrorKind::Required);
        assert_eq!(error.humanized(), "This field is required.");
    }

    #[test]
    fn lowercase_permission_fails_the_pattern() {
        let error = permission_name()
            .check(&values(&[("name", "read_user")]))
            .expect("error");
        assert_eq!(error.kind, FieldErrorKind::Pattern);
        assert_eq!(error.humanized(), "Invalid format.");
        assert!(permission_name().check(&values(&[("name", "READ_USER")])).is_none());
    }

    #[test]
    fn length_limits_use_their_numeric_bound() {
        let field = Field::new("name", "Role name", FieldKind::Text)
            .rules(FieldRules::default().min_length(2).max_length(4));
        let short = field.check(&values(&[("name", "a")])).expect("error");
        assert_eq!(short.humanized(), "Must be at least 2 characters long.");
        let long = field.check(&values(&[("name", "abcde")])).expect("error");
        assert_eq!(long.humanized(), "Cannot exceed 4 characters.");
        assert!(field.check(&values(&[("name", "")])).is_none());
    }

    #[test]
    fn validators_see_all_values() {
        let confirm = Field::new("confirmPassword", "Confirm password", FieldKind::Password).rules(
            FieldRules::default().required().validate(|value, all| {
                if value.as_text() == Some(all.text("password")) {
                    Ok(())
                } else {
                    Err("The passwords do not match.".to_string())
                }
            }),
        );
        let error = confirm
            .check(&values(&[("password", "secret1"), ("confirmPassword", "secret2")]))
            .expect("error");
        assert_eq!(error.humanized(), "The passwords do not match.");
        assert!(
            confirm
                .check(&values(&[("password", "secret1"), ("confirmPassword", "secret1")]))
                .is_none()
        );
    }

    #[test]
    fn server_and_validate_errors_fall_back_to_generic_text() {
        assert_eq!(
            FieldError::new(FieldErrorKind::Validate).humanized(),
            "Validation error."
        );
        assert_eq!(FieldError::server("Taken").humanized(), "Taken");
    }

    #[test]
    fn checkbox_groups_collect_repeated_pairs() {
        let fields = vec![
            Field::new("name", "Role name", FieldKind::Text),
            Field::new("permissions", "Permissions", FieldKind::CheckboxGroup),
        ];
        let pairs = vec![
            ("name".to_string(), "editor".to_string()),
            ("permissions".to_string(), "1".to_string()),
            ("permissions".to_string(), "3".to_string()),
            ("stray".to_string(), "x".to_string()),
        ];
        let values = FormValues::from_pairs(&fields, &pairs);
        assert_eq!(values.text("name"), "editor");
        assert_eq!(values.list("permissions"), ["1", "3"]);
        assert!(!values.contains("stray"));
    }

    #[test]
    fn preprocessing_turns_object_lists_into_ids() {
        let fields = vec![Field::new("permissions", "Permissions", FieldKind::CheckboxGroup)];
        let item = json!({
            "id": "r1",
            "name": "editor",
            "permissions": [{"id": "p1", "name": "A"}, {"id": "p2", "name": "B"}]
        });
        let processed = preprocess_item(&item, &fields);
        assert_eq!(processed["permissions"], json!(["p1", "p2"]));
        assert_eq!(processed["name"], json!("editor"));

        let values = FormValues::from_item(&item, &fields);
        assert_eq!(values.list("permissions"), ["p1", "p2"]);
    }

    #[test]
    fn preprocessing_leaves_plain_lists_alone() {
        let fields = vec![Field::new("permissions", "Permissions", FieldKind::CheckboxGroup)];
        let item = json!({"permissions": ["p1"]});
        assert_eq!(preprocess_item(&item, &fields), item);
    }
}
