//! Generic authenticated request execution.
//!
//! [`ApiClient::execute`] is the single path every backend call takes:
//!
//! 1. credentials are read from durable storage and attached, a bearer token
//!    taking precedence over an API key
//! 2. the response body is parsed as JSON whatever the status
//! 3. a non-success status becomes [`RequestError::Api`] carrying the body's
//!    `message` field
//! 4. a success body is decoded into the caller's typed contract
//!
//! Every failure is logged before it is returned. There are no retries.

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{RequestError, Result, GENERIC_ERROR_MESSAGE};
use crate::storage::{DurableStore, API_KEY_KEY, AUTH_TOKEN_KEY};
use crate::ClientConfig;

/// Header carrying a standalone API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// A single request against a relative backend endpoint.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    endpoint: String,
    query: Vec<(String, String)>,
    body: Option<Value>,
    headers: HeaderMap,
}

impl ApiRequest {
    /// Create a request with the given method and endpoint (e.g. `/api/auth/me`).
    #[must_use]
    pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            query: Vec::new(),
            body: None,
            headers: HeaderMap::new(),
        }
    }

    /// `GET` request.
    #[must_use]
    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(Method::GET, endpoint)
    }

    /// `POST` request.
    #[must_use]
    pub fn post(endpoint: impl Into<String>) -> Self {
        Self::new(Method::POST, endpoint)
    }

    /// `PUT` request.
    #[must_use]
    pub fn put(endpoint: impl Into<String>) -> Self {
        Self::new(Method::PUT, endpoint)
    }

    /// `DELETE` request.
    #[must_use]
    pub fn delete(endpoint: impl Into<String>) -> Self {
        Self::new(Method::DELETE, endpoint)
    }

    /// Append query parameters.
    #[must_use]
    pub fn query<K, V>(mut self, params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.query
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Attach a JSON body.
    ///
    /// # Errors
    ///
    /// Returns `RequestError::Encode` if `body` cannot be serialized.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self> {
        let value = serde_json::to_value(body).map_err(|e| RequestError::Encode(e.to_string()))?;
        self.body = Some(value);
        Ok(self)
    }

    /// Add an extra header. Credential headers are applied after extras.
    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Relative endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Client for the callboard backend REST API.
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    config: ClientConfig,
    store: Arc<dyn DurableStore>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client for the configured backend.
    ///
    /// Credentials are read from `store` on every request.
    ///
    /// # Errors
    ///
    /// Returns `RequestError::Transport` if the HTTP client cannot be built.
    pub fn new(config: ClientConfig, store: Arc<dyn DurableStore>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| RequestError::Transport(format!("failed to create HTTP client: {e}")))?;

        Ok(Self::with_client(client, config, store))
    }

    /// Create a client with a custom reqwest client.
    #[must_use]
    pub fn with_client(
        client: reqwest::Client,
        config: ClientConfig,
        store: Arc<dyn DurableStore>,
    ) -> Self {
        Self {
            client,
            config,
            store,
        }
    }

    /// Get the client configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Get the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Get the durable store credentials are read from.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn DurableStore> {
        &self.store
    }

    /// Build the credential headers from durable storage.
    fn credential_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();

        let token = self.store.get(AUTH_TOKEN_KEY)?.filter(|t| !t.is_empty());
        if let Some(token) = token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| RequestError::Encode("token is not a valid header value".into()))?;
            headers.insert(AUTHORIZATION, value);
            return Ok(headers);
        }

        let api_key = self.store.get(API_KEY_KEY)?.filter(|k| !k.is_empty());
        if let Some(key) = api_key {
            let value = HeaderValue::from_str(&key)
                .map_err(|_| RequestError::Encode("API key is not a valid header value".into()))?;
            headers.insert(HeaderName::from_static(API_KEY_HEADER), value);
        }

        Ok(headers)
    }

    /// Execute a request and decode the success body into `T`.
    ///
    /// # Errors
    ///
    /// Returns a `RequestError` for transport failures, non-success
    /// statuses, non-JSON bodies, or bodies that do not match `T`.
    pub async fn execute<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let result = self.execute_inner(&request).await;

        if let Err(err) = &result {
            tracing::error!(
                method = %request.method,
                endpoint = %request.endpoint,
                status = ?err.status_code(),
                error = %err,
                "API request failed"
            );
        }

        result
    }

    async fn execute_inner<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<T> {
        let url = self.config.url(&request.endpoint);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.extend(request.headers.clone());
        headers.extend(self.credential_headers()?);

        let mut builder = self
            .client
            .request(request.method.clone(), &url)
            .headers(headers);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        tracing::debug!(
            method = %request.method,
            endpoint = %request.endpoint,
            status = status.as_u16(),
            "API response received"
        );

        let parsed = parse_body(&bytes);

        if !status.is_success() {
            let message = parsed
                .ok()
                .as_ref()
                .and_then(|body| body.get("message"))
                .and_then(Value::as_str)
                .filter(|m| !m.trim().is_empty())
                .map_or_else(|| GENERIC_ERROR_MESSAGE.to_string(), str::to_string);

            return Err(RequestError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = parsed.map_err(|e| RequestError::InvalidJson(e.to_string()))?;
        serde_json::from_value(body).map_err(|e| RequestError::UnexpectedShape(e.to_string()))
    }

    /// Execute a request and return the raw JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::execute`].
    pub async fn execute_json(&self, request: ApiRequest) -> Result<Value> {
        self.execute(request).await
    }
}

/// Parse a response body; an empty body reads as `null`.
fn parse_body(bytes: &[u8]) -> std::result::Result<Value, serde_json::Error> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(bytes)
}
