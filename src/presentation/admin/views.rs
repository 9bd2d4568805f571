use askama::Template;

mod auth;
mod home;
mod posts;
mod profile;
mod resource;
mod toast;

pub use auth::*;
pub use home::*;
pub use posts::*;
pub use profile::*;
pub use resource::*;
pub use toast::*;

#[derive(Clone)]
pub struct AdminNavigationItemView {
    pub label: String,
    pub href: String,
    pub is_active: bool,
}

#[derive(Clone)]
pub struct AdminAccountView {
    pub email: String,
    pub role_label: String,
    pub profile_href: String,
    pub logout_action: String,
}

#[derive(Clone)]
pub struct AdminChrome {
    pub brand: String,
    pub title: String,
    pub navigation: Vec<AdminNavigationItemView>,
    pub account: Option<AdminAccountView>,
    pub theme: &'static str,
    pub theme_action: String,
    /// Shown in place of the navigation when the account has no usable role.
    pub navigation_notice: Option<String>,
}

#[derive(Clone)]
pub struct AdminLayout<T> {
    pub chrome: AdminChrome,
    pub asset_version: String,
    pub content: T,
}

impl<T> AdminLayout<T> {
    pub fn new(chrome: AdminChrome, content: T) -> Self {
        Self {
            chrome,
            asset_version: asset_version(),
            content,
        }
    }
}

fn asset_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// The empty modal slot; patching it in closes any open dialog.
#[derive(Template)]
#[template(path = "admin/modal_slot.html")]
pub struct AdminModalSlotTemplate {}
