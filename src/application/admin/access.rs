//! Roles and permissions, managed side by side.

use std::sync::Arc;

use quire_api_types::{Permission, PermissionPayload, Role, RolePayload};
use regex::Regex;
use tracing::info;

use crate::application::{
    repos::{PermissionsRepo, RolesRepo},
    resource::{
        Column, Confirmation, DeleteOutcome, Field, FieldKind, FieldOption, FieldRules,
        FormValues, ResourceManager, ResourceRoutes,
    },
    session::Session,
    toasts::Notices,
};
use crate::presentation::admin::views::{ResourceCellView, ResourcePageView};

use super::{PERMISSION_KEY_PATTERN, reject};

const ROLE_DELETE_PROMPT: &str = "Are you sure you want to delete this role?";
const PERMISSION_DELETE_PROMPT: &str = "Are you sure you want to delete this permission?";

#[derive(Clone)]
pub struct AccessService {
    roles: Arc<dyn RolesRepo>,
    permissions: Arc<dyn PermissionsRepo>,
}

impl AccessService {
    pub fn new(roles: Arc<dyn RolesRepo>, permissions: Arc<dyn PermissionsRepo>) -> Self {
        Self { roles, permissions }
    }

    /// Fetch roles and permissions together. Either failure keeps both prior lists.
    pub async fn load(&self, session: &Session, notices: &Notices) {
        let collections = session.collections();
        let auth = session.credentials();
        let roles_ticket = collections.roles.begin_load();
        let permissions_ticket = collections.permissions.begin_load();

        let (permissions, roles) = futures::join!(
            self.permissions.list_permissions(auth),
            self.roles.list_roles(auth)
        );

        match (permissions, roles) {
            (Ok(permissions), Ok(roles)) => {
                info!(
                    target = "quire::application::admin::access",
                    roles = roles.len(),
                    permissions = permissions.len(),
                    "loaded access lists"
                );
                collections.permissions.finish_load(permissions_ticket, permissions);
                collections.roles.finish_load(roles_ticket, roles);
            }
            (Err(err), _) | (_, Err(err)) => {
                notices.repo_error(&err);
                collections.permissions.abandon_load(permissions_ticket);
                collections.roles.abandon_load(roles_ticket);
            }
        }
    }

    pub fn page_view(&self, session: &Session, notices: &Notices) -> ResourcePageView {
        ResourcePageView {
            heading: "Access & Roles".to_string(),
            load_action: "/access/panel".to_string(),
            tables: vec![
                self.roles_manager(session, notices).table_view(),
                self.permissions_manager(session, notices).table_view(),
            ],
        }
    }

    pub fn roles_manager(&self, session: &Session, notices: &Notices) -> ResourceManager<Role> {
        let collection = session.collections().roles.clone();
        let permission_options: Vec<FieldOption> = session
            .collections()
            .permissions
            .snapshot()
            .into_iter()
            .map(|permission| FieldOption::new(permission.id, permission.name))
            .collect();

        let create = {
            let repo = self.roles.clone();
            let auth = session.credentials().clone();
            let collection = collection.clone();
            let notices = notices.clone();
            move |values: FormValues| {
                let repo = repo.clone();
                let auth = auth.clone();
                let collection = collection.clone();
                let notices = notices.clone();
                async move {
                    let role = repo
                        .create_role(&auth, &role_payload(&values))
                        .await
                        .map_err(|err| reject(&notices, err))?;
                    collection.apply_created(role);
                    Ok(())
                }
            }
        };

        let edit = {
            let repo = self.roles.clone();
            let auth = session.credentials().clone();
            let collection = collection.clone();
            let notices = notices.clone();
            move |id: String, values: FormValues| {
                let repo = repo.clone();
                let auth = auth.clone();
                let collection = collection.clone();
                let notices = notices.clone();
                async move {
                    let role = repo
                        .update_role(&auth, &id, &role_payload(&values))
                        .await
                        .map_err(|err| reject(&notices, err))?;
                    collection.apply_updated(role);
                    Ok(())
                }
            }
        };

        let delete = {
            let repo = self.roles.clone();
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
                            ROLE_DELETE_PROMPT.to_string(),
                        ));
                    }
                    repo.delete_role(&auth, &id)
                        .await
                        .map_err(|err| reject(&notices, err))?;
                    collection.apply_deleted(&id);
                    Ok(DeleteOutcome::Deleted)
                }
            }
        };

        ResourceManager::new(
            "roles",
            "System roles",
            ResourceRoutes::new("/access/roles"),
            collection,
        )
        .columns(role_columns())
        .fields(role_fields(permission_options))
        .on_create(create)
        .on_edit(edit)
        .on_delete(delete)
    }

    pub fn permissions_manager(
        &self,
        session: &Session,
        notices: &Notices,
    ) -> ResourceManager<Permission> {
        let collection = session.collections().permissions.clone();

        let create = {
            let repo = self.permissions.clone();
            let auth = session.credentials().clone();
            let collection = collection.clone();
            let notices = notices.clone();
            move |values: FormValues| {
                let repo = repo.clone();
                let auth = auth.clone();
                let collection = collection.clone();
                let notices = notices.clone();
                async move {
                    let permission = repo
                        .create_permission(&auth, &permission_payload(&values))
                        .await
                        .map_err(|err| reject(&notices, err))?;
                    collection.apply_created(permission);
                    Ok(())
                }
            }
        };

        let edit = {
            let repo = self.permissions.clone();
            let auth = session.credentials().clone();
            let collection = collection.clone();
            let notices = notices.clone();
            move |id: String, values: FormValues| {
                let repo = repo.clone();
                let auth = auth.clone();
                let collection = collection.clone();
                let notices = notices.clone();
                async move {
                    let permission = repo
                        .update_permission(&auth, &id, &permission_payload(&values))
                        .await
                        .map_err(|err| reject(&notices, err))?;
                    collection.apply_updated(permission);
                    Ok(())
                }
            }
        };

        let delete = {
            let repo = self.permissions.clone();
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
                            PERMISSION_DELETE_PROMPT.to_string(),
                        ));
                    }
                    repo.delete_permission(&auth, &id)
                        .await
                        .map_err(|err| reject(&notices, err))?;
                    collection.apply_deleted(&id);
                    Ok(DeleteOutcome::Deleted)
                }
            }
        };

        ResourceManager::new(
            "permissions",
            "Available permissions",
            ResourceRoutes::new("/access/permissions"),
            collection,
        )
        .columns(permission_columns())
        .fields(permission_fields())
        .on_create(create)
        .on_edit(edit)
        .on_delete(delete)
    }
}

fn role_columns() -> Vec<Column<Role>> {
    vec![
        Column::field("name", "Role name")
            .render(|role: &Role| ResourceCellView::text(role.name.clone()).with_class("strong")),
        Column::field("description", "Description")
            .class("wide-only")
            .render(|role: &Role| {
                ResourceCellView::text(described(role.description.as_deref())).with_class("muted")
            }),
        Column::field("permissions", "Permissions")
            .class("narrow center")
            .render(|role: &Role| {
                ResourceCellView::badge(role.permissions.as_ref().map_or(0, Vec::len).to_string())
            }),
        Column::actions("Actions").class("narrow center"),
    ]
}

fn permission_columns() -> Vec<Column<Permission>> {
    vec![
        Column::field("name", "Permission key").render(|permission: &Permission| {
            ResourceCellView::text(permission.name.clone()).with_class("code")
        }),
        Column::field("description", "Description").render(|permission: &Permission| {
            ResourceCellView::text(described(permission.description.as_deref()))
        }),
        Column::actions("Actions").class("narrow center"),
    ]
}

fn described(description: Option<&str>) -> String {
    description
        .filter(|text| !text.is_empty())
        .unwrap_or("No description")
        .to_string()
}

pub fn role_fields(permission_options: Vec<FieldOption>) -> Vec<Field> {
    vec![
        Field::new("name", "Role name", FieldKind::Text)
            .placeholder("Ej: editor, user")
            .rules(FieldRules::default().required().min_length(2)),
        Field::new("description", "Description", FieldKind::Textarea)
            .placeholder("Brief description of responsibilities.")
            .rules(FieldRules::default().max_length(150)),
        Field::new("permissions", "Permissions", FieldKind::CheckboxGroup)
            .options(permission_options),
    ]
}

pub fn permission_fields() -> Vec<Field> {
    let pattern = Regex::new(PERMISSION_KEY_PATTERN).ok();
    let mut rules = FieldRules::default().required();
    if let Some(pattern) = pattern {
        rules = rules.pattern(pattern);
    }
    vec![
        Field::new("name", "Permission key", FieldKind::Text)
            .placeholder("Ej: READ_USER, CREATE_POST, etc")
            .rules(rules),
        Field::new("description", "Description (Optional)", FieldKind::Textarea)
            .placeholder("What this permit authorizes..")
            .rules(FieldRules::default().max_length(150)),
    ]
}

fn role_payload(values: &FormValues) -> RolePayload {
    RolePayload {
        name: Some(values.text("name").to_string()),
        description: values
            .contains("description")
            .then(|| values.text("description").to_string()),
        permissions: values
            .contains("permissions")
            .then(|| values.list("permissions").to_vec()),
    }
}

fn permission_payload(values: &FormValues) -> PermissionPayload {
    PermissionPayload {
        name: Some(values.text("name").to_string()),
        description: values
            .contains("description")
            .then(|| values.text("description").to_string()),
    }
}
