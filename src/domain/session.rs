//! Authenticated account and per-browser preferences.

use std::fmt;

/// The signed-in account as reported by the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub id: String,
    pub name: Option<String>,
    pub email: String,
    pub role_name: Option<String>,
}

impl SessionUser {
    /// Part of the email before `@`, used in greetings.
    pub fn display_name(&self) -> &str {
        self.email.split('@').next().unwrap_or(self.email.as_str())
    }

    pub fn dashboard(&self) -> DashboardKind {
        DashboardKind::for_role(self.role_name.as_deref())
    }

    /// Role name with its first letter upper-cased; `User` when unassigned.
    pub fn role_label(&self) -> String {
        let role = self.role_name.as_deref().unwrap_or("user");
        let mut chars = role.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => "User".to_string(),
        }
    }
}

/// Which set of sections a user sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardKind {
    Admin,
    Editor,
    Unassigned,
}

impl DashboardKind {
    pub fn for_role(role_name: Option<&str>) -> Self {
        match role_name {
            Some("admin") => DashboardKind::Admin,
            Some("editor") => DashboardKind::Editor,
            _ => DashboardKind::Unassigned,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
