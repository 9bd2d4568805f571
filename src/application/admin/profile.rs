//! The signed-in user's own account.

use std::collections::BTreeMap;
use std::sync::Arc;

use quire_api_types::{User, UserPayload};
use regex::Regex;
use tracing::info;

use crate::{
    application::{
        repos::{RepoError, UsersRepo},
        resource::{
            Confirmation, DeleteOutcome, Field, FieldError, FieldKind, FieldRules, FormValues,
            field_views, validate_form,
        },
        session::Session,
        toasts::Notices,
    },
    domain::session::SessionUser,
    presentation::admin::views::AdminProfileView,
};

use super::EMAIL_PATTERN;

pub const PROFILE_PATH: &str = "/profile";
pub const ACCOUNT_DELETED_MESSAGE: &str = "Your account has been deleted.";
const DELETE_PROMPT: &str =
    "Are you sure you want to delete your account? This cannot be undone.";

/// Values and errors currently shown in the profile form.
#[derive(Debug, Clone, Default)]
pub struct ProfileForm {
    pub values: FormValues,
    pub errors: BTreeMap<String, FieldError>,
}

impl ProfileForm {
    pub fn from_user(user: &User) -> Self {
        let item = serde_json::to_value(user).unwrap_or_default();
        Self {
            values: FormValues::from_item(&item, &profile_fields()),
            errors: BTreeMap::new(),
        }
    }
}

#[derive(Debug)]
pub enum ProfileOutcome {
    Saved(ProfileForm),
    /// Validation or the API rejected the values; the form shows why.
    Rejected(ProfileForm),
}

#[derive(Clone)]
pub struct ProfileService {
    users: Arc<dyn UsersRepo>,
}

impl ProfileService {
    pub fn new(users: Arc<dyn UsersRepo>) -> Self {
        Self { users }
    }

    pub async fn load(&self, session: &Session, notices: &Notices) -> Option<ProfileForm> {
        let id = session.user().id;
        match self.users.get_user(session.credentials(), &id).await {
            Ok(user) => Some(ProfileForm::from_user(&user)),
            Err(err) => {
                notices.repo_error(&err);
                None
            }
        }
    }

    pub fn view(&self, form: &ProfileForm, is_saving: bool) -> AdminProfileView {
        AdminProfileView {
            heading: "My profile".to_string(),
            fields: field_views(&profile_fields(), &form.values, &form.errors),
            form_action: PROFILE_PATH.to_string(),
            reload_action: format!("{PROFILE_PATH}/panel"),
            delete_action: format!("{PROFILE_PATH}/delete"),
            is_saving,
        }
    }

    pub async fn update(
        &self,
        session: &Session,
        notices: &Notices,
        pairs: &[(String, String)],
    ) -> ProfileOutcome {
        let fields = profile_fields();
        let values = FormValues::from_pairs(&fields, pairs);
        let errors = validate_form(&fields, &values);
        if !errors.is_empty() {
            return ProfileOutcome::Rejected(ProfileForm { values, errors });
        }

        let current = session.user();
        let payload = UserPayload {
            name: Some(values.text("name").to_string()),
            username: Some(values.text("username").to_string()),
            email: Some(values.text("email").to_string()),
            bio: Some(values.text("bio").to_string()),
            ..UserPayload::default()
        };

        match self
            .users
            .update_user(session.credentials(), &current.id, &payload)
            .await
        {
            Ok(user) => {
                session.set_user(SessionUser {
                    name: Some(user.name.clone()).filter(|name| !name.is_empty()),
                    email: user.email.clone(),
                    ..current
                });
                info!(
                    target = "quire::application::admin::profile",
                    user_id = %user.id,
                    "profile updated"
                );
                notices.success("Profile updated successfully.");
                ProfileOutcome::Saved(ProfileForm::from_user(&user))
            }
            Err(err) => {
                notices.repo_error(&err);
                let errors = err
                    .field_errors()
                    .map(|fields| {
                        fields
                            .iter()
                            .map(|(name, message)| (name.clone(), FieldError::server(message)))
                            .collect()
                    })
                    .unwrap_or_default();
                ProfileOutcome::Rejected(ProfileForm { values, errors })
            }
        }
    }

    /// Delete the signed-in account. The caller ends the session on `Deleted`.
    pub async fn delete_account(
        &self,
        session: &Session,
        notices: &Notices,
        confirmation: Confirmation,
    ) -> Result<DeleteOutcome, RepoError> {
        if confirmation == Confirmation::Pending {
            return Ok(DeleteOutcome::ConfirmationRequired(DELETE_PROMPT.to_string()));
        }
        let id = session.user().id;
        match self.users.delete_user(session.credentials(), &id).await {
            Ok(()) => {
                info!(
                    target = "quire::application::admin::profile",
                    user_id = %id,
                    "account deleted"
                );
                Ok(DeleteOutcome::Deleted)
            }
            Err(err) => {
                notices.repo_error(&err);
                Err(err)
            }
        }
    }
}

pub fn profile_fields() -> Vec<Field> {
    let email_rules = match Regex::new(EMAIL_PATTERN) {
        Ok(pattern) => FieldRules::default().required().pattern(pattern),
        Err(_) => FieldRules::default().required(),
    };
    vec![
        Field::new("name", "Full name", FieldKind::Text)
            .rules(FieldRules::default().required().min_length(2)),
        Field::new("username", "Username", FieldKind::Text)
            .rules(FieldRules::default().required().min_length(2)),
        Field::new("email", "Email address", FieldKind::Email).rules(email_rules),
        Field::new("bio", "Bio", FieldKind::Textarea)
            .placeholder("Tell readers a little about yourself")
            .rules(FieldRules::default().max_length(300)),
    ]
}
