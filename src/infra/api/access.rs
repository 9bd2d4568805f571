use async_trait::async_trait;
use quire_api_types::{Permission, PermissionPayload, Role, RolePayload};
use reqwest::Method;

use crate::application::repos::{Credentials, PermissionsRepo, RepoError, RolesRepo};

use super::BlogApiClient;

#[async_trait]
impl RolesRepo for BlogApiClient {
    async fn list_roles(&self, auth: &Credentials) -> Result<Vec<Role>, RepoError> {
        self.get("roles", auth).await
    }

    async fn create_role(
        &self,
        auth: &Credentials,
        payload: &RolePayload,
    ) -> Result<Role, RepoError> {
        self.send_body(Method::POST, "roles", auth, payload).await
    }

    async fn update_role(
        &self,
        auth: &Credentials,
        id: &str,
        payload: &RolePayload,
    ) -> Result<Role, RepoError> {
        self.send_body(Method::PUT, &format!("roles/{id}"), auth, payload)
            .await
    }

    async fn delete_role(&self, auth: &Credentials, id: &str) -> Result<(), RepoError> {
        self.delete(&format!("roles/{id}"), auth).await
    }
}

#[async_trait]
impl PermissionsRepo for BlogApiClient {
    async fn list_permissions(&self, auth: &Credentials) -> Result<Vec<Permission>, RepoError> {
        self.get("permissions", auth).await
    }

    async fn create_permission(
        &self,
        auth: &Credentials,
        payload: &PermissionPayload,
    ) -> Result<Permission, RepoError> {
        self.send_body(Method::POST, "permissions", auth, payload)
            .await
    }

    async fn update_permission(
        &self,
        auth: &Credentials,
        id: &str,
        payload: &PermissionPayload,
    ) -> Result<Permission, RepoError> {
        self.send_body(Method::PUT, &format!("permissions/{id}"), auth, payload)
            .await
    }

    async fn delete_permission(&self, auth: &Credentials, id: &str) -> Result<(), RepoError> {
        self.delete(&format!("permissions/{id}"), auth).await
    }
}
