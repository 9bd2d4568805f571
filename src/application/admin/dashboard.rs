use crate::domain::session::{DashboardKind, SessionUser};
use crate::presentation::admin::views::{AdminHomeCardView, AdminHomeView};

const ADMIN_CARDS: &[(&str, &str)] = &[
    (
        "Full Access Control",
        "Manage users, roles, and permissions across the entire system.",
    ),
    (
        "Global Administration",
        "Access all configuration and moderation tools.",
    ),
];
const EDITOR_CARDS: &[(&str, &str)] = &[
    (
        "Content Management",
        "Access tools for creating, editing, and publishing content.",
    ),
    (
        "Review Status",
        "Track the status of your submissions and publications.",
    ),
];

#[derive(Clone, Default)]
pub struct AdminDashboardService;

impl AdminDashboardService {
    pub fn new() -> Self {
        Self
    }

    pub fn home(&self, user: &SessionUser) -> AdminHomeView {
        let cards = match user.dashboard() {
            DashboardKind::Admin => ADMIN_CARDS,
            DashboardKind::Editor => EDITOR_CARDS,
            DashboardKind::Unassigned => &[],
        };

        AdminHomeView {
            greeting: format!("Welcome, {}!", user.display_name()),
            role_line: format!("You are logged in with the role {}.", user.role_label()),
            cards: cards
                .iter()
                .map(|(title, body)| AdminHomeCardView {
                    title: (*title).to_string(),
                    body: (*body).to_string(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn home_greets_by_email_local_part() {
        let user = SessionUser {
            id: "1".into(),
            name: Some("Grace Hopper".into()),
            email: "grace@navy.mil".into(),
            role_name: Some("editor".into()),
        };
        let view = AdminDashboardService::new().home(&user);
        assert_eq!(view.greeting, "Welcome, grace!");
        assert_eq!(view.role_line, "You are logged in with the role Editor.");
        assert_eq!(view.cards[0].title, "Content Management");
    }
}
