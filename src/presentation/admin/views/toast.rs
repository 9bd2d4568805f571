use askama::Template;

#[derive(Clone)]
pub struct AdminToastItem {
    pub id: String,
    pub kind: &'static str,
    pub heading: Option<String>,
    pub lines: Vec<String>,
    pub ttl_ms: u64,
}

impl AdminToastItem {
    pub fn is_list(&self) -> bool {
        self.heading.is_some()
    }
}

#[derive(Template)]
#[template(path = "admin/toast_stack.html")]
pub struct AdminToastStackTemplate {
    pub toasts: Vec<AdminToastItem>,
}
