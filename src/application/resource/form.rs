//! The modal form that creates or edits one resource.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::presentation::admin::views::{FormFieldView, FormOptionView, ResourceModalView};

use super::fields::{Field, FieldError, FieldKind, FormValues, validate_form};

/// Fields that are never seeded from an existing item.
const WRITE_ONLY_FIELDS: [&str; 2] = ["password", "confirmPassword"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit { id: String },
}

impl FormMode {
    pub fn is_edit(&self) -> bool {
        matches!(self, FormMode::Edit { .. })
    }
}

#[derive(Debug, Clone)]
pub struct FormModal {
    mode: FormMode,
    fields: Vec<Field>,
    values: FormValues,
    errors: BTreeMap<String, FieldError>,
}

impl FormModal {
    pub fn create(fields: Vec<Field>) -> Self {
        Self {
            mode: FormMode::Create,
            fields,
            values: FormValues::new(),
            errors: BTreeMap::new(),
        }
    }

    /// Open an edit form seeded from `item`, with write-only fields left blank.
    pub fn edit(id: impl Into<String>, item: &Value, fields: Vec<Field>) -> Self {
        let mut values = FormValues::from_item(item, &fields);
        for name in WRITE_ONLY_FIELDS {
            if fields.iter().any(|field| field.name == name) {
                values.set_text(name, "");
            }
        }
        Self {
            mode: FormMode::Edit { id: id.into() },
            fields,
            values,
            errors: BTreeMap::new(),
        }
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn values(&self) -> &FormValues {
        &self.values
    }

    pub fn errors(&self) -> &BTreeMap<String, FieldError> {
        &self.errors
    }

    /// "Add"/"Edit" followed by the first field's label without a trailing `s`.
    pub fn title(&self) -> String {
        let verb = if self.mode.is_edit() { "Edit" } else { "Add" };
        let noun = self
            .fields
            .first()
            .map(|field| field.label.strip_suffix('s').unwrap_or(field.label))
            .filter(|noun| !noun.is_empty())
            .unwrap_or("resource");
        format!("{verb} {noun}")
    }

    /// Take a submission and validate it. Returns `true` when every field passes.
    pub fn accept(&mut self, values: FormValues) -> bool {
        self.errors = validate_form(&self.fields, &values);
        self.values = values;
        self.errors.is_empty()
    }

    /// Attach messages the API returned for individual fields.
    pub fn attach_server_errors(&mut self, fields: &BTreeMap<String, String>) {
        for (name, message) in fields {
            self.errors
                .insert(name.clone(), FieldError::server(message.clone()));
        }
    }

    pub fn view(&self, form_action: String, close_action: String, is_saving: bool) -> ResourceModalView {
        ResourceModalView {
            title: self.title(),
            form_action,
            close_action,
            fields: field_views(&self.fields, &self.values, &self.errors),
            submit_label: if is_saving {
                "Saving...".to_string()
            } else {
                "Save changes".to_string()
            },
            is_saving,
        }
    }
}

/// Render a field schema with its current values and errors.
pub fn field_views(
    fields: &[Field],
    values: &FormValues,
    errors: &BTreeMap<String, FieldError>,
) -> Vec<FormFieldView> {
    fields
        .iter()
        .map(|field| {
            let selected = values.list(field.name);
            let current = values.text(field.name);
            let options = field
                .options
                .iter()
                .map(|option| FormOptionView {
                    value: option.value.clone(),
                    label: option.label.clone(),
                    selected: match field.kind {
                        FieldKind::CheckboxGroup => selected.contains(&option.value),
                        _ => current == option.value,
                    },
                })
                .collect();

            let control = match field.kind {
                FieldKind::Textarea => "textarea",
                FieldKind::Select => "select",
                FieldKind::CheckboxGroup => "checkboxes",
                FieldKind::Text | FieldKind::Email | FieldKind::Number | FieldKind::Password => {
                    "input"
                }
            };

            let placeholder = match (&field.placeholder, field.kind) {
                (Some(placeholder), _) => placeholder.clone(),
                (None, FieldKind::Select) => {
                    format!("Select a {}", field.label.to_lowercase())
                }
                (None, _) => String::new(),
            };

            let value = match field.kind {
                FieldKind::Password => String::new(),
                _ => current.to_string(),
            };

            FormFieldView {
                name: field.name.to_string(),
                label: field.label.to_string(),
                control,
                input_type: field.kind.input_type(),
                value,
                placeholder,
                required: field.rules.required,
                error: errors.get(field.name).map(FieldError::humanized),
                options,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::super::fields::{FieldOption, FieldRules};
    use super::*;

    fn user_fields() -> Vec<Field> {
        vec![
            Field::new("name", "Full name", FieldKind::Text)
                .rules(FieldRules::default().required()),
            Field::new("roleId", "Assigned role", FieldKind::Select).options(vec![
                FieldOption::new("r1", "admin"),
                FieldOption::new("r2", "editor"),
            ]),
            Field::new("password", "Password", FieldKind::Password),
            Field::new("confirmPassword", "Confirm password", FieldKind::Password),
        ]
    }

    #[test]
    fn edit_forms_blank_write_only_fields() {
        let item = json!({"id": "u1", "name": "Ada", "roleId": "r2", "password": "hash"});
        let modal = FormModal::edit("u1", &item, user_fields());
        assert_eq!(modal.values().text("name"), "Ada");
        assert_eq!(modal.values().text("password"), "");
        assert_eq!(modal.values().text("confirmPassword"), "");
        assert_eq!(modal.title(), "Edit Full name");
    }

    #[test]
    fn titles_fall_back_to_resource() {
        assert_eq!(FormModal::create(Vec::new()).title(), "Add resource");
        let roles = vec![Field::new("name", "Roles", FieldKind::Text)];
        assert_eq!(FormModal::create(roles).title(), "Add Role");
    }

    #[test]
    fn views_mark_selection_and_errors() {
        let mut modal = FormModal::create(user_fields());
        let mut values = FormValues::new();
        values.set_text("roleId", "r1");
        values.set_text("password", "secret");
        assert!(!modal.accept(values));

        let views = modal.view("/users".into(), "/_modal/close".into(), false);
        assert_eq!(views.title, "Add Full name");
        assert_eq!(views.submit_label, "Save changes");

        let name = &views.fields[0];
        assert!(name.required);
        assert_eq!(name.error.as_deref(), Some("This field is required."));

        let role = &views.fields[1];
        assert_eq!(role.control, "select");
        assert_eq!(role.placeholder, "Select a assigned role");
        assert!(role.options[0].selected);
        assert!(!role.options[1].selected);

        let password = &views.fields[2];
        assert_eq!(password.value, "");
        assert_eq!(password.input_type, "password");
    }

    #[test]
    fn server_errors_land_on_their_fields() {
        let mut modal = FormModal::create(user_fields());
        let mut server = BTreeMap::new();
        server.insert("name".to_string(), "Name already taken".to_string());
        modal.attach_server_errors(&server);

        let view = modal.view("/users".into(), "/_modal/close".into(), true);
        assert_eq!(view.fields[0].error.as_deref(), Some("Name already taken"));
        assert_eq!(view.submit_label, "Saving...");
    }
}
