//! CSS selectors targeted by datastar patches.

pub const TOAST_STACK: &str = "[data-admin-toast=\"stack\"]";
pub const MODAL_SLOT: &str = "[data-admin-modal]";

pub const POSTS_PANEL: &str = "[data-admin-panel=\"posts\"]";
pub const EDITOR_PANEL: &str = "[data-admin-panel=\"editor\"]";
pub const PROFILE_PANEL: &str = "[data-admin-panel=\"profile\"]";

pub fn resource_panel(key: &str) -> String {
    format!("[data-resource-panel=\"{key}\"]")
}
