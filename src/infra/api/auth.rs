use async_trait::async_trait;
use quire_api_types::{AuthUser, LoginRequest, LoginResponse, RegisterRequest};
use reqwest::Method;
use serde_json::{Map, Value};

use crate::application::repos::{AuthRepo, Credentials, RepoError};

use super::BlogApiClient;

#[async_trait]
impl AuthRepo for BlogApiClient {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, RepoError> {
        self.send_body(Method::POST, "auth/login", &Credentials::anonymous(), request)
            .await
    }

    /// Registration goes through the public user endpoint; the created user is not needed.
    async fn register(&self, request: &RegisterRequest) -> Result<(), RepoError> {
        self.send_body_unit(Method::POST, "users", &Credentials::anonymous(), request)
            .await
    }

    async fn me(&self, auth: &Credentials) -> Result<AuthUser, RepoError> {
        self.get("auth/me", auth).await
    }

    async fn logout(&self, auth: &Credentials) -> Result<(), RepoError> {
        self.send_body_unit(Method::POST, "auth/logout", auth, &Value::Object(Map::new()))
            .await
    }
}
