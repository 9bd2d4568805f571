use askama::Template;

use super::AdminLayout;

#[derive(Clone)]
pub struct AdminHomeCardView {
    pub title: String,
    pub body: String,
}

#[derive(Clone)]
pub struct AdminHomeView {
    pub greeting: String,
    pub role_line: String,
    pub cards: Vec<AdminHomeCardView>,
}

#[derive(Template)]
#[template(path = "admin/home.html")]
pub struct AdminHomeTemplate {
    pub view: AdminLayout<AdminHomeView>,
}
