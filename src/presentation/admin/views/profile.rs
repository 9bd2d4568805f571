use askama::Template;

use super::{AdminLayout, FormFieldView};

#[derive(Clone)]
pub struct AdminProfileView {
    pub heading: String,
    pub fields: Vec<FormFieldView>,
    pub form_action: String,
    pub reload_action: String,
    pub delete_action: String,
    pub is_saving: bool,
}

#[derive(Template)]
#[template(path = "admin/profile.html")]
pub struct AdminProfileTemplate {
    pub view: AdminLayout<AdminProfileView>,
}

#[derive(Template)]
#[template(path = "admin/profile_panel.html")]
pub struct AdminProfilePanelTemplate {
    pub content: AdminProfileView,
}
