//! reqwest adapter for the upstream blog API.
//!
//! One [`BlogApiClient`] implements every repository trait. Responses may wrap
//! their payload in a `{ "data": ... }` envelope or return it bare; both decode.
//! Non-2xx responses are classified by [`classify_error_response`].

mod access;
mod auth;
mod posts;
mod users;

use std::time::Instant;

use metrics::{counter, histogram};
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url, header::AUTHORIZATION};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::debug;

use quire_api_types::ApiErrorBody;

use crate::{
    application::{
        repos::{Credentials, RepoError},
        toasts::classify_error_response,
    },
    config::ApiSettings,
    infra::error::InfraError,
};

pub(crate) const METRIC_API_REQUESTS: &str = "quire_api_requests_total";
pub(crate) const METRIC_API_REQUEST_MS: &str = "quire_api_request_ms";

#[derive(Deserialize)]
#[serde(untagged)]
enum Envelope<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Envelope<T> {
    fn into_inner(self) -> T {
        match self {
            Envelope::Wrapped { data } | Envelope::Bare(data) => data,
        }
    }
}

#[derive(Clone, Debug)]
pub struct BlogApiClient {
    client: Client,
    base: Url,
}

impl BlogApiClient {
    pub fn new(settings: &ApiSettings) -> Result<Self, InfraError> {
        let client = Client::builder()
            .user_agent(Self::user_agent())
            .timeout(settings.timeout)
            .build()
            .map_err(|err| InfraError::http_client(err.to_string()))?;
        Ok(Self::with_client(client, settings.base_url.clone()))
    }

    pub fn with_client(client: Client, mut base: Url) -> Self {
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Self { client, base }
    }

    pub fn user_agent() -> &'static str {
        concat!("quire/", env!("CARGO_PKG_VERSION"))
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn url(&self, path: &str) -> Result<Url, RepoError> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(RepoError::transport)
    }

    fn request(
        &self,
        method: Method,
        path: &str,
        auth: &Credentials,
    ) -> Result<RequestBuilder, RepoError> {
        let url = self.url(path)?;
        let request = self.client.request(method, url);
        Ok(match auth.token() {
            Some(token) => request.header(AUTHORIZATION, format!("Bearer {token}")),
            None => request,
        })
    }

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        auth: &Credentials,
    ) -> Result<T, RepoError> {
        let request = self.request(Method::GET, path, auth)?;
        self.send_json(Method::GET, path, request).await
    }

    pub(crate) async fn send_body<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        auth: &Credentials,
        body: &B,
    ) -> Result<T, RepoError> {
        let request = self.request(method.clone(), path, auth)?.json(body);
        self.send_json(method, path, request).await
    }

    pub(crate) async fn send_body_unit<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        auth: &Credentials,
        body: &B,
    ) -> Result<(), RepoError> {
        let request = self.request(method.clone(), path, auth)?.json(body);
        self.send(method, path, request).await.map(drop)
    }

    pub(crate) async fn delete(&self, path: &str, auth: &Credentials) -> Result<(), RepoError> {
        let request = self.request(Method::DELETE, path, auth)?;
        self.send(Method::DELETE, path, request).await.map(drop)
    }

    pub(crate) async fn send_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        auth: &Credentials,
        form: reqwest::multipart::Form,
    ) -> Result<T, RepoError> {
        let request = self.request(Method::POST, path, auth)?.multipart(form);
        self.send_json(Method::POST, path, request).await
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        request: RequestBuilder,
    ) -> Result<T, RepoError> {
        let bytes = self.send(method, path, request).await?;
        serde_json::from_slice::<Envelope<T>>(&bytes)
            .map(Envelope::into_inner)
            .map_err(RepoError::decode)
    }

    /// Send and return the body of a 2xx response.
    async fn send(
        &self,
        method: Method,
        path: &str,
        request: RequestBuilder,
    ) -> Result<bytes::Bytes, RepoError> {
        let started = Instant::now();
        let result = request.send().await;
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        histogram!(METRIC_API_REQUEST_MS, "method" => method.to_string()).record(elapsed_ms);

        let response = match result {
            Ok(response) => response,
            Err(err) => {
                counter!(METRIC_API_REQUESTS, "outcome" => "transport").increment(1);
                return Err(RepoError::transport(err));
            }
        };

        let status = response.status();
        let bytes = response.bytes().await.map_err(RepoError::transport)?;
        debug!(
            target = "quire::infra::api",
            method = %method,
            path,
            status = status.as_u16(),
            elapsed_ms,
            "api request completed"
        );

        if status.is_success() {
            counter!(METRIC_API_REQUESTS, "outcome" => "success").increment(1);
            return Ok(bytes);
        }

        counter!(METRIC_API_REQUESTS, "outcome" => "rejected").increment(1);
        Err(classify_failure(status, &bytes))
    }
}

fn classify_failure(status: StatusCode, body: &[u8]) -> RepoError {
    let body = serde_json::from_slice::<ApiErrorBody>(body).ok();
    classify_error_response(status.as_u16(), body)
}
