//! Repository traits describing the upstream blog API.
//!
//! Every call takes the caller's [`Credentials`]; adapters never hold per-user state.

use std::collections::BTreeMap;

use async_trait::async_trait;
use quire_api_types::{
    AuthUser, CreatePostPayload, LoginRequest, LoginResponse, Permission, PermissionPayload, Post,
    RegisterRequest, Role, RolePayload, UpdatePostPayload, User, UserPayload,
};
use thiserror::Error;

use crate::domain::content::PendingImage;

pub const UNEXPECTED_ERROR_MESSAGE: &str = "An unexpected error occurred";

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("upstream request failed: {0}")]
    Transport(String),
    #[error("upstream response could not be decoded: {0}")]
    Decode(String),
    #[error("not authenticated")]
    Unauthorized,
    #[error("resource not found")]
    NotFound,
    /// The API rejected specific form fields.
    #[error("field validation failed: {0:?}")]
    FieldErrors(BTreeMap<String, String>),
    #[error("upstream rejected the request with status {status}: {messages:?}")]
    Rejected { status: u16, messages: Vec<String> },
}

impl RepoError {
    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }

    pub fn decode(err: impl std::fmt::Display) -> Self {
        Self::Decode(err.to_string())
    }

    /// Lines shown to the user in an error toast.
    pub fn toast_messages(&self) -> Vec<String> {
        match self {
            RepoError::Rejected { messages, .. } if !messages.is_empty() => messages.clone(),
            RepoError::FieldErrors(fields) if !fields.is_empty() => {
                fields.values().cloned().collect()
            }
            RepoError::Rejected { status, .. } => {
                vec![format!("Request failed with status code {status}")]
            }
            RepoError::Unauthorized => vec!["Your session has expired. Please sign in again.".to_string()],
            RepoError::NotFound => vec!["The requested resource no longer exists.".to_string()],
            RepoError::FieldErrors(_) | RepoError::Transport(_) | RepoError::Decode(_) => {
                vec![UNEXPECTED_ERROR_MESSAGE.to_string()]
            }
        }
    }

    pub fn field_errors(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            RepoError::FieldErrors(fields) => Some(fields),
            _ => None,
        }
    }
}

/// Bearer token forwarded to the API on behalf of one browser session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    bearer: Option<String>,
}

impl Credentials {
    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            bearer: Some(token.into()),
        }
    }

    pub fn anonymous() -> Self {
        Self { bearer: None }
    }

    pub fn token(&self) -> Option<&str> {
        self.bearer.as_deref()
    }
}

#[async_trait]
pub trait RolesRepo: Send + Sync {
    async fn list_roles(&self, auth: &Credentials) -> Result<Vec<Role>, RepoError>;

    async fn create_role(&self, auth: &Credentials, payload: &RolePayload)
    -> Result<Role, RepoError>;

    async fn update_role(
        &self,
        auth: &Credentials,
        id: &str,
        payload: &RolePayload,
    ) -> Result<Role, RepoError>;

    async fn delete_role(&self, auth: &Credentials, id: &str) -> Result<(), RepoError>;
}

#[async_trait]
pub trait PermissionsRepo: Send + Sync {
    async fn list_permissions(&self, auth: &Credentials) -> Result<Vec<Permission>, RepoError>;

    async fn create_permission(
        &self,
        auth: &Credentials,
        payload: &PermissionPayload,
    ) -> Result<Permission, RepoError>;

    async fn update_permission(
        &self,
        auth: &Credentials,
        id: &str,
        payload: &PermissionPayload,
    ) -> Result<Permission, RepoError>;

    async fn delete_permission(&self, auth: &Credentials, id: &str) -> Result<(), RepoError>;
}

#[async_trait]
pub trait UsersRepo: Send + Sync {
    async fn list_users(&self, auth: &Credentials) -> Result<Vec<User>, RepoError>;

    async fn get_user(&self, auth: &Credentials, id: &str) -> Result<User, RepoError>;

    async fn create_user(&self, auth: &Credentials, payload: &UserPayload)
    -> Result<User, RepoError>;

    async fn update_user(
        &self,
        auth: &Credentials,
        id: &str,
        payload: &UserPayload,
    ) -> Result<User, RepoError>;

    async fn delete_user(&self, auth: &Credentials, id: &str) -> Result<(), RepoError>;
}

#[async_trait]
pub trait PostsRepo: Send + Sync {
    async fn list_posts_by_user(
        &self,
        auth: &Credentials,
        user_id: &str,
    ) -> Result<Vec<Post>, RepoError>;

    async fn get_post(&self, auth: &Credentials, id: &str) -> Result<Post, RepoError>;

    async fn create_post(
        &self,
        auth: &Credentials,
        payload: &CreatePostPayload,
    ) -> Result<Post, RepoError>;

    async fn update_post(
        &self,
        auth: &Credentials,
        id: &str,
        payload: &UpdatePostPayload,
    ) -> Result<Post, RepoError>;

    async fn delete_post(&self, auth: &Credentials, id: &str) -> Result<(), RepoError>;
}

#[async_trait]
pub trait ImagesRepo: Send + Sync {
    /// Upload a post image and return the id the API assigned to it.
    async fn upload_post_image(
        &self,
        auth: &Credentials,
        post_id: &str,
        image: &PendingImage,
    ) -> Result<String, RepoError>;

    async fn delete_image(&self, auth: &Credentials, id: &str) -> Result<(), RepoError>;
}

#[async_trait]
pub trait AuthRepo: Send + Sync {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, RepoError>;

    async fn register(&self, request: &RegisterRequest) -> Result<(), RepoError>;

    async fn me(&self, auth: &Credentials) -> Result<AuthUser, RepoError>;

    async fn logout(&self, auth: &Credentials) -> Result<(), RepoError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_errors_surface_their_messages() {
        let err = RepoError::Rejected {
            status: 422,
            messages: vec!["Name taken".into(), "Unknown error".into()],
        };
        assert_eq!(err.toast_messages(), vec!["Name taken", "Unknown error"]);
    }

    #[test]
    fn empty_rejection_falls_back_to_status_line() {
        let err = RepoError::Rejected {
            status: 500,
            messages: Vec::new(),
        };
        assert_eq!(
            err.toast_messages(),
            vec!["Request failed with status code 500"]
        );
    }

    #[test]
    fn transport_failures_use_the_generic_message() {
        let err = RepoError::transport("connection refused");
        assert_eq!(err.toast_messages(), vec![UNEXPECTED_ERROR_MESSAGE]);
        assert!(err.field_errors().is_none());
    }
}
