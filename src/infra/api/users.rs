use async_trait::async_trait;
use quire_api_types::{User, UserPayload};
use reqwest::Method;

use crate::application::repos::{Credentials, RepoError, UsersRepo};

use super::BlogApiClient;

#[async_trait]
impl UsersRepo for BlogApiClient {
    async fn list_users(&self, auth: &Credentials) -> Result<Vec<User>, RepoError> {
        self.get("users", auth).await
    }

    async fn get_user(&self, auth: &Credentials, id: &str) -> Result<User, RepoError> {
        self.get(&format!("users/{id}"), auth).await
    }

    async fn create_user(
        &self,
        auth: &Credentials,
        payload: &UserPayload,
    ) -> Result<User, RepoError> {
        self.send_body(Method::POST, "users", auth, payload).await
    }

    async fn update_user(
        &self,
        auth: &Credentials,
        id: &str,
        payload: &UserPayload,
    ) -> Result<User, RepoError> {
        self.send_body(Method::PUT, &format!("users/{id}"), auth, payload)
            .await
    }

    async fn delete_user(&self, auth: &Credentials, id: &str) -> Result<(), RepoError> {
        self.delete(&format!("users/{id}"), auth).await
    }
}
