use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use super::error::ApiError;
use super::naming::{NamingApi, NamingKind};

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8888";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection settings resolved during provider configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub endpoint: String,
    /// Upper bound for one request, including reading the body
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Naming service API client
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http_client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl Client {
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let endpoint = Url::parse(&config.endpoint)
            .map_err(|e| ApiError::InvalidEndpoint(format!("{}: {}", config.endpoint, e)))?;

        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(ApiError::InvalidEndpoint(format!(
                "{}: scheme must be http or https",
                config.endpoint
            )));
        }

        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(ClientInner {
                http_client,
                base_url: config.endpoint.trim_end_matches('/').to_string(),
                timeout: config.timeout,
            }),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.inner.timeout
    }

    /// Naming operations for one record kind
    pub fn naming<K: NamingKind>(&self) -> NamingApi<'_, K> {
        NamingApi::new(self)
    }

    /// Execute a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url(path);
        tracing::debug!("GET request to: {}", url);

        let response = self.send(self.inner.http_client.get(&url), path).await?;
        self.parse_response(response).await
    }

    /// Execute a POST request with a JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.url(path);
        tracing::debug!("POST request to: {}", url);

        let response = self
            .send(self.inner.http_client.post(&url).json(body), path)
            .await?;
        self.parse_response(response).await
    }

    /// Execute a PUT request with a JSON body
    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.url(path);
        tracing::debug!("PUT request to: {}", url);

        let response = self
            .send(self.inner.http_client.put(&url).json(body), path)
            .await?;
        self.parse_response(response).await
    }

    /// Execute a DELETE request. The response body carries nothing we use.
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let url = self.url(path);
        tracing::debug!("DELETE request to: {}", url);

        self.send(self.inner.http_client.delete(&url), path)
            .await
            .map(|_| ())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.inner.base_url, path)
    }

    /// Sends the request and sorts the response by status: any 2xx is a
    /// success, 404 is `NotFound` for the requested path.
    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        path: &str,
    ) -> Result<reqwest::Response, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        tracing::debug!("Response status: {}", status);

        if status.is_success() {
            return Ok(response);
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(path.to_string()));
        }

        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        tracing::error!("API error response: {}", message);

        Err(ApiError::Status {
            status: status.as_u16(),
            message,
        })
    }

    async fn parse_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let text = response
            .text()
            .await
            .map_err(|e| self.transport_error(e))?;
        tracing::debug!("API response body: {}", text);

        serde_json::from_str(&text).map_err(|e| {
            tracing::error!("Failed to deserialize response: {}, body: {}", e, text);
            ApiError::ParseError(format!("Failed to parse response: {}", e))
        })
    }

    fn transport_error(&self, e: reqwest::Error) -> ApiError {
        if e.is_timeout() {
            ApiError::Timeout(self.inner.timeout.as_secs_f64())
        } else {
            ApiError::RequestError(e)
        }
    }
}
