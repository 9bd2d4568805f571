//! Views for the generic resource table and its modal form.

use askama::Template;

use super::AdminLayout;

#[derive(Clone)]
pub struct ResourceHeaderView {
    pub label: String,
    pub class: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceActionView {
    pub label: &'static str,
    pub action: String,
    /// `get` opens a dialog, `post` performs a mutation.
    pub method: &'static str,
    pub is_danger: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceCellView {
    pub text: String,
    pub class: Option<String>,
    pub actions: Vec<ResourceActionView>,
}

impl ResourceCellView {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            class: None,
            actions: Vec::new(),
        }
    }

    pub fn badge(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            class: Some("badge".to_string()),
            actions: Vec::new(),
        }
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    pub fn has_actions(&self) -> bool {
        !self.actions.is_empty()
    }
}

#[derive(Clone)]
pub struct ResourceRowView {
    pub id: String,
    pub cells: Vec<ResourceCellView>,
}

#[derive(Clone)]
pub struct ResourceTableView {
    pub key: String,
    pub title: String,
    pub create_action: Option<String>,
    pub create_disabled: bool,
    pub is_loading: bool,
    pub loading_message: String,
    pub empty_message: String,
    pub empty_hint: Option<String>,
    pub headers: Vec<ResourceHeaderView>,
    pub rows: Vec<ResourceRowView>,
}

impl ResourceTableView {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A page made of one or more resource tables.
#[derive(Clone)]
pub struct ResourcePageView {
    pub heading: String,
    pub load_action: String,
    pub tables: Vec<ResourceTableView>,
}

#[derive(Template)]
#[template(path = "admin/resources.html")]
pub struct ResourcePageTemplate {
    pub view: AdminLayout<ResourcePageView>,
}

#[derive(Template)]
#[template(path = "admin/resource_panel.html")]
pub struct ResourcePanelTemplate {
    pub table: ResourceTableView,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormOptionView {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormFieldView {
    pub name: String,
    pub label: String,
    /// One of `input`, `textarea`, `select` or `checkboxes`.
    pub control: &'static str,
    pub input_type: &'static str,
    pub value: String,
    pub placeholder: String,
    pub required: bool,
    pub error: Option<String>,
    pub options: Vec<FormOptionView>,
}

#[derive(Clone)]
pub struct ResourceModalView {
    pub title: String,
    pub form_action: String,
    pub close_action: String,
    pub fields: Vec<FormFieldView>,
    pub submit_label: String,
    pub is_saving: bool,
}

#[derive(Template)]
#[template(path = "admin/resource_modal.html")]
pub struct ResourceModalTemplate {
    pub modal: ResourceModalView,
}

#[derive(Clone)]
pub struct ConfirmDialogView {
    pub title: String,
    pub message: String,
    pub confirm_action: String,
    pub confirm_label: String,
    pub close_action: String,
}

#[derive(Template)]
#[template(path = "admin/confirm_modal.html")]
pub struct ConfirmDialogTemplate {
    pub dialog: ConfirmDialogView,
}
