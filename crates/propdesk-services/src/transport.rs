//! Network port of the fetch wrapper

use async_trait::async_trait;
use propdesk_cache::RequestOptions;
use reqwest::Client;
use std::time::Duration;
use url::Url;

use crate::error::{FetchError, FetchResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }

    pub fn is_write(&self) -> bool {
        !matches!(self, HttpMethod::Get)
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Performs requests against the REST API.
///
/// Paths are API-relative (`/v1/properties/`); responses are JSON. An empty
/// body (e.g. `204 No Content`) decodes to `Value::Null`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str, options: &RequestOptions) -> FetchResult<serde_json::Value>;

    async fn send(
        &self,
        method: HttpMethod,
        url: &str,
        options: &RequestOptions,
        body: Option<&serde_json::Value>,
    ) -> FetchResult<serde_json::Value>;
}

/// `reqwest` transport with a base URL and optional bearer token
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Url,
    bearer_token: Option<String>,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> FetchResult<Self> {
        let base_url =
            Url::parse(base_url).map_err(|_| FetchError::InvalidUrl(base_url.to_string()))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            bearer_token: None,
        })
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn resolve(&self, url: &str) -> FetchResult<Url> {
        self.base_url
            .join(url)
            .map_err(|_| FetchError::InvalidUrl(url.to_string()))
    }

    async fn execute(
        &self,
        method: HttpMethod,
        url: &str,
        options: &RequestOptions,
        body: Option<&serde_json::Value>,
    ) -> FetchResult<serde_json::Value> {
        let target = self.resolve(url)?;
        let mut request = self.client.request(method.into(), target);

        if !options.query.is_empty() {
            request = request.query(&options.query);
        }
        for (name, value) in &options.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                method,
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        if text.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str, options: &RequestOptions) -> FetchResult<serde_json::Value> {
        self.execute(HttpMethod::Get, url, options, None).await
    }

    async fn send(
        &self,
        method: HttpMethod,
        url: &str,
        options: &RequestOptions,
        body: Option<&serde_json::Value>,
    ) -> FetchResult<serde_json::Value> {
        self.execute(method, url, options, body).await
    }
}
