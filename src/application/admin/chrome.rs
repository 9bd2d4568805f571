use crate::domain::session::{DashboardKind, SessionUser, Theme};
use crate::presentation::admin::views::{AdminAccountView, AdminChrome, AdminNavigationItemView};

const BRAND: &str = "Blog";
const ADMIN_NAV_ITEMS: &[(&str, &str)] = &[
    ("/", "Home"),
    ("/access", "Access & Roles"),
    ("/users", "Users"),
];
const EDITOR_NAV_ITEMS: &[(&str, &str)] = &[
    ("/", "Home"),
    ("/posts", "My Posts"),
    ("/posts/new", "Create post"),
];
const NO_ROLE_NOTICE: &str = "No role assigned";

/// Navigation entries available to a dashboard kind.
pub fn navigation_items(kind: DashboardKind) -> &'static [(&'static str, &'static str)] {
    match kind {
        DashboardKind::Admin => ADMIN_NAV_ITEMS,
        DashboardKind::Editor => EDITOR_NAV_ITEMS,
        DashboardKind::Unassigned => &[],
    }
}

#[derive(Clone, Default)]
pub struct AdminChromeService;

impl AdminChromeService {
    pub fn new() -> Self {
        Self
    }

    /// Chrome for pages rendered before sign-in.
    pub fn anonymous(&self, title: &str, theme: Theme) -> AdminChrome {
        AdminChrome {
            brand: BRAND.to_string(),
            title: format!("{BRAND} · {title}"),
            navigation: Vec::new(),
            account: None,
            theme: theme.as_str(),
            theme_action: "/theme".to_string(),
            navigation_notice: None,
        }
    }

    pub fn load(&self, user: &SessionUser, theme: Theme, active_path: &str) -> AdminChrome {
        let kind = user.dashboard();
        let navigation: Vec<AdminNavigationItemView> = navigation_items(kind)
            .iter()
            .map(|(href, label)| AdminNavigationItemView {
                label: (*label).to_string(),
                href: (*href).to_string(),
                is_active: *href == active_path,
            })
            .collect();

        let active_label = navigation
            .iter()
            .find(|item| item.is_active)
            .map(|item| item.label.clone())
            .unwrap_or_else(|| match active_path {
                "/profile" => "Profile".to_string(),
                _ => "Dashboard".to_string(),
            });

        AdminChrome {
            brand: BRAND.to_string(),
            title: format!("{BRAND} · {active_label}"),
            navigation,
            account: Some(AdminAccountView {
                email: user.email.clone(),
                role_label: user.role_label(),
                profile_href: "/profile".to_string(),
                logout_action: "/logout".to_string(),
            }),
            theme: theme.as_str(),
            theme_action: "/theme".to_string(),
            navigation_notice: (kind == DashboardKind::Unassigned)
                .then(|| NO_ROLE_NOTICE.to_string()),
        }
    }
}
