//! System users, with roles loaded alongside for the role column and select.

use std::sync::Arc;

use quire_api_types::{Role, User, UserPayload};
use regex::Regex;
use tracing::info;

use crate::application::{
    repos::{RolesRepo, UsersRepo},
    resource::{
        Column, Confirmation, DeleteOutcome, Field, FieldKind, FieldOption, FieldRules,
        FormMode, FormValues, ResourceManager, ResourceRoutes,
    },
    session::Session,
    toasts::Notices,
};
use crate::presentation::admin::views::{ResourceCellView, ResourcePageView};

use super::{EMAIL_PATTERN, reject};

const USER_DELETE_PROMPT: &str = "Are you sure you want to delete this user?";
const USER_CREATED_MESSAGE: &str = "User created successfully!";
const PASSWORD_MISMATCH_MESSAGE: &str = "The passwords do not match.";
const NO_ROLE_LABEL: &str = "NO ROLE";

#[derive(Clone)]
pub struct UsersService {
    users: Arc<dyn UsersRepo>,
    roles: Arc<dyn RolesRepo>,
}

impl UsersService {
    pub fn new(users: Arc<dyn UsersRepo>, roles: Arc<dyn RolesRepo>) -> Self {
        Self { users, roles }
    }

    /// Fetch users and roles together. Either failure keeps both prior lists.
    pub async fn load(&self, session: &Session, notices: &Notices) {
        let collections = session.collections();
        let auth = session.credentials();
        let users_ticket = collections.users.begin_load();
        let roles_ticket = collections.roles.begin_load();

        let (users, roles) =
            futures::join!(self.users.list_users(auth), self.roles.list_roles(auth));

        match (users, roles) {
            (Ok(users), Ok(roles)) => {
                info!(
                    target = "quire::application::admin::users",
                    users = users.len(),
                    roles = roles.len(),
                    "loaded users"
                );
                collections.users.finish_load(users_ticket, users);
                collections.roles.finish_load(roles_ticket, roles);
            }
            (Err(err), _) | (_, Err(err)) => {
                notices.repo_error(&err);
                collections.users.abandon_load(users_ticket);
                collections.roles.abandon_load(roles_ticket);
            }
        }
    }

    pub fn page_view(&self, session: &Session, notices: &Notices) -> ResourcePageView {
        ResourcePageView {
            heading: "Users".to_string(),
            load_action: "/users/panel".to_string(),
            tables: vec![self.manager(session, notices).table_view()],
        }
    }

    pub fn manager(&self, session: &Session, notices: &Notices) -> ResourceManager<User> {
        let collection = session.collections().users.clone();
        let roles = session.collections().roles.snapshot();

        let create = {
            let repo = self.users.clone();
            let auth = session.credentials().clone();
            let collection = collection.clone();
            let notices = notices.clone();
            move |values: FormValues| {
                let repo = repo.clone();
                let auth = auth.clone();
                let collection = collection.clone();
                let notices = notices.clone();
                async move {
                    let user = repo
                        .create_user(&auth, &user_payload(&values, false))
                        .await
                        .map_err(|err| reject(&notices, err))?;
                    collection.apply_created(user);
                    notices.success(USER_CREATED_MESSAGE);
                    Ok(())
                }
            }
        };

        let edit = {
            let repo = self.users.clone();
            let auth = session.credentials().clone();
            let collection = collection.clone();
            let notices = notices.clone();
            move |id: String, values: FormValues| {
                let repo = repo.clone();
                let auth = auth.clone();
                let collection = collection.clone();
                let notices = notices.clone();
                async move {
                    let updated = repo
                        .update_user(&auth, &id, &user_payload(&values, true))
                        .await
                        .map_err(|err| reject(&notices, err))?;
                    let merged = merge_user(collection.find(&id), updated);
                    collection.apply_updated(merged);
                    Ok(())
                }
            }
        };

        let delete = {
            let repo = self.users.clone();
            let auth = session.credentials().clone();
            let collection = collection.clone();
            let notices = notices.clone();
            move |id: String, confirmation: Confirmation| {
                let repo = repo.clone();
                let auth = auth.clone();
                let collection = collection.clone();
                let notices = notices.clone();
                async move {
                    if confirmation == Confirmation::Pending {
                        return Ok(DeleteOutcome::ConfirmationRequired(
                            USER_DELETE_PROMPT.to_string(),
                        ));
                    }
                    repo.delete_user(&auth, &id)
                        .await
                        .map_err(|err| reject(&notices, err))?;
                    collection.apply_deleted(&id);
                    Ok(DeleteOutcome::Deleted)
                }
            }
        };

        let field_roles = roles.clone();
        ResourceManager::new(
            "users",
            "System users",
            ResourceRoutes::new("/users"),
            collection,
        )
        .columns(user_columns(roles))
        .fields_with(move |mode| user_fields(mode, &field_roles))
        .on_create(create)
        .on_edit(edit)
        .on_delete(delete)
    }
}

fn user_columns(roles: Vec<Role>) -> Vec<Column<User>> {
    vec![
        Column::field("name", "Full name")
            .render(|user: &User| ResourceCellView::text(user.name.clone()).with_class("strong")),
        Column::field("email", "Email")
            .render(|user: &User| ResourceCellView::text(user.email.clone()).with_class("muted")),
        Column::field("roleId", "Role")
            .class("narrow center")
            .render(move |user: &User| {
                let name = role_name(&roles, user.role_id.as_deref());
                let cell = ResourceCellView::badge(name.to_uppercase());
                if name == "admin" {
                    cell.with_class("badge danger")
                } else {
                    cell
                }
            }),
        Column::actions("Actions").class("narrow center"),
    ]
}

fn role_name<'a>(roles: &'a [Role], role_id: Option<&str>) -> &'a str {
    role_id
        .and_then(|id| roles.iter().find(|role| role.id == id))
        .map(|role| role.name.as_str())
        .unwrap_or(NO_ROLE_LABEL)
}

/// Password rules only apply when creating; an edit may leave it blank.
pub fn user_fields(mode: &FormMode, roles: &[Role]) -> Vec<Field> {
    let is_edit = mode.is_edit();
    let email_rules = match Regex::new(EMAIL_PATTERN) {
        Ok(pattern) => FieldRules::default().required().pattern(pattern),
        Err(_) => FieldRules::default().required(),
    };

    let (password_rules, confirm_rules) = if is_edit {
        (FieldRules::default(), FieldRules::default())
    } else {
        (
            FieldRules::default().required().min_length(6),
            FieldRules::default().required().validate(|value, all| {
                if value.as_text() == Some(all.text("password")) {
                    Ok(())
                } else {
                    Err(PASSWORD_MISMATCH_MESSAGE.to_string())
                }
            }),
        )
    };

    vec![
        Field::new("name", "Full name", FieldKind::Text)
            .placeholder("First and Last Name")
            .rules(FieldRules::default().required().min_length(2)),
        Field::new("username", "Username", FieldKind::Text)
            .rules(FieldRules::default().required().min_length(2)),
        Field::new("email", "Email address", FieldKind::Email)
            .placeholder("example@domain.com")
            .rules(email_rules),
        Field::new("roleId", "Assigned role", FieldKind::Select)
            .placeholder("Select a role")
            .options(
                roles
                    .iter()
                    .map(|role| FieldOption::new(role.id.clone(), role.name.clone()))
                    .collect(),
            )
            .rules(FieldRules::default().required()),
        Field::new("password", "Password", FieldKind::Password)
            .placeholder(if is_edit {
                "Leave blank to keep unchanged"
            } else {
                "Minimum 6 characters"
            })
            .rules(password_rules),
        Field::new("confirmPassword", "Confirm password", FieldKind::Password)
            .placeholder("Repeat the password")
            .rules(confirm_rules),
    ]
}

/// Blank passwords are left out of edits so the stored one is kept.
fn user_payload(values: &FormValues, is_edit: bool) -> UserPayload {
    let password = Some(values.text("password").to_string())
        .filter(|password| !(is_edit && password.is_empty()));
    let confirm_password = Some(values.text("confirmPassword").to_string())
        .filter(|confirm| !(is_edit && confirm.is_empty()));

    UserPayload {
        name: Some(values.text("name").to_string()),
        username: Some(values.text("username").to_string()),
        email: Some(values.text("email").to_string()),
        password,
        confirm_password,
        role_id: Some(values.text("roleId").to_string()),
        bio: None,
    }
}

/// Overlay an update response on the stored user, keeping fields it omits.
fn merge_user(existing: Option<User>, updated: User) -> User {
    match existing {
        Some(existing) => User {
            profile_pic_id: updated.profile_pic_id.or(existing.profile_pic_id),
            bio: updated.bio.or(existing.bio),
            role_id: updated.role_id.or(existing.role_id),
            ..updated
        },
        None => updated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn role(id: &str, name: &str) -> Role {
        Role {
            id: id.into(),
            name: name.into(),
            description: None,
            permissions: None,
        }
    }

    fn user() -> User {
        User {
            id: "u1".into(),
            name: "Ada".into(),
            username: "ada".into(),
            email: "ada@example.com".into(),
            profile_pic_id: Some("pic".into()),
            bio: Some("Analyst".into()),
            role_id: Some("r1".into()),
        }
    }

    #[test]
    fn create_forms_require_matching_passwords() {
        let fields = user_fields(&FormMode::Create, &[]);
        let mut values = FormValues::new();
        values.set_text("password", "secret1");
        values.set_text("confirmPassword", "secret2");
        let confirm = fields.iter().find(|field| field.name == "confirmPassword");
        let error = confirm.and_then(|field| field.check(&values)).expect("error");
        assert_eq!(error.humanized(), PASSWORD_MISMATCH_MESSAGE);

        let password = fields.iter().find(|field| field.name == "password").expect("field");
        assert_eq!(password.placeholder.as_deref(), Some("Minimum 6 characters"));
    }

    #[test]
    fn edit_forms_accept_blank_passwords() {
        let fields = user_fields(&FormMode::Edit { id: "u1".into() }, &[]);
        let values = FormValues::new();
        for name in ["password", "confirmPassword"] {
            let field = fields.iter().find(|field| field.name == name).expect("field");
            assert!(field.check(&values).is_none());
        }
        let mut values = FormValues::new();
        values.set_text("name", "Ada");
        values.set_text("password", "");
        let payload = user_payload(&values, true);
        assert!(payload.password.is_none());
        assert!(payload.confirm_password.is_none());
        assert_eq!(payload.name.as_deref(), Some("Ada"));
    }

    #[test]
    fn role_badges_resolve_names() {
        let roles = vec![role("r1", "admin"), role("r2", "editor")];
        assert_eq!(role_name(&roles, Some("r2")), "editor");
        assert_eq!(role_name(&roles, Some("zz")), "NO ROLE");
        assert_eq!(role_name(&roles, None), "NO ROLE");

        let column = &user_columns(roles)[2];
        let manager_cell = ResourceManager::new(
            "users",
            "System users",
            ResourceRoutes::new("/users"),
            {
                let collection = Arc::new(crate::application::resource::ResourceCollection::new());
                let ticket = collection.begin_load();
                collection.finish_load(ticket, vec![user()]);
                collection
            },
        )
        .columns(vec![column.clone()])
        .table_view();
        assert_eq!(manager_cell.rows[0].cells[0].text, "ADMIN");
        assert_eq!(manager_cell.rows[0].cells[0].class.as_deref(), Some("badge danger"));
    }

    #[test]
    fn updates_keep_fields_the_response_omits() {
        let mut updated = user();
        updated.name = "Ada L.".into();
        updated.bio = None;
        updated.profile_pic_id = None;
        let merged = merge_user(Some(user()), updated);
        assert_eq!(merged.name, "Ada L.");
        assert_eq!(merged.bio.as_deref(), Some("Analyst"));
        assert_eq!(merged.profile_pic_id.as_deref(), Some("pic"));
    }
}
