use askama::Template;

use super::{AdminLayout, FormFieldView};

#[derive(Clone)]
pub struct AdminAuthFormView {
    pub heading: String,
    pub form_action: String,
    pub fields: Vec<FormFieldView>,
    pub submit_label: String,
    pub error: Option<String>,
    pub notice: Option<String>,
    pub alternate_prompt: String,
    pub alternate_label: String,
    pub alternate_href: String,
}

#[derive(Template)]
#[template(path = "admin/auth.html")]
pub struct AdminAuthTemplate {
    pub view: AdminLayout<AdminAuthFormView>,
}
