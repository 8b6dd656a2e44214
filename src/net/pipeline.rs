//! The request pipeline: one configured HTTP client plus its interceptors.
//!
//! DESIGN
//! ======
//! Requests are built with `reqwest::RequestBuilder`, materialized into a
//! `reqwest::Request`, passed through each `RequestInterceptor` in order, and
//! only then handed to `reqwest::Client::execute`. Reading the session at
//! that point (rather than when the builder was created) means a request
//! always carries whatever token is current when it leaves the process.
//!
//! TRADE-OFFS
//! ==========
//! The backend answers some routes with a bare text message instead of JSON,
//! so bodies are parsed leniently: JSON when it parses, otherwise the trimmed
//! text as a JSON string.

use std::sync::Arc;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::ApiError;
use super::interceptor::{CredentialInterceptor, RequestInterceptor, ResponseInterceptor};
use crate::config::ClientConfig;
use crate::session::Session;

/// Status and parsed body of a 2xx response.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    /// Deserialize the body into `T`.
    pub fn json<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        serde_json::from_value(self.body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// The body when the backend answered with a plain message.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.body.as_str()
    }
}

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<Session>,
    request_interceptors: Vec<Arc<dyn RequestInterceptor>>,
    response_interceptors: Vec<Arc<dyn ResponseInterceptor>>,
}

impl ApiClient {
    /// Build the pipeline for `config.api_base_url`, attaching `session`'s
    /// credential to every request.
    pub fn new(config: &ClientConfig, session: Arc<Session>) -> Result<Self, ApiError> {
        let base_url = crate::config::normalize_base_url(&config.api_base_url);
        let parsed = reqwest::Url::parse(&base_url).map_err(|e| ApiError::InvalidUrl(format!("{base_url}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ApiError::InvalidUrl(base_url));
        }

        let mut builder = reqwest::Client::builder().cookie_store(true);
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = config.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        let http = builder.build().map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;

        let credential = CredentialInterceptor::new(Arc::clone(&session), config.auth_scheme);
        Ok(Self {
            http,
            base_url,
            session,
            request_interceptors: vec![Arc::new(credential)],
            response_interceptors: Vec::new(),
        })
    }

    /// Append a request interceptor. It runs after the credential interceptor.
    #[must_use]
    pub fn with_request_interceptor(mut self, interceptor: impl RequestInterceptor + 'static) -> Self {
        self.request_interceptors.push(Arc::new(interceptor));
        self
    }

    #[must_use]
    pub fn with_response_interceptor(mut self, interceptor: impl ResponseInterceptor + 'static) -> Self {
        self.response_interceptors.push(Arc::new(interceptor));
        self
    }

    #[must_use]
    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a backend path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        }
    }

    /// Start a request against `path`. Nothing is sent until it goes through
    /// [`ApiClient::execute`] or [`ApiClient::dispatch`].
    #[must_use]
    pub fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        self.http.request(method, self.url(path))
    }

    /// Run the interceptor chains around a single send and return the raw
    /// response, whatever its status.
    pub async fn execute(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let mut request = builder.build()?;
        for interceptor in &self.request_interceptors {
            interceptor.intercept(&mut request)?;
        }

        tracing::debug!(method = %request.method(), url = %request.url(), "dispatching request");
        let response = self.http.execute(request).await?;

        for interceptor in &self.response_interceptors {
            interceptor.on_response(&response)?;
        }
        Ok(response)
    }

    /// Send and read the body; non-2xx becomes [`ApiError::Status`].
    pub async fn dispatch(&self, builder: reqwest::RequestBuilder) -> Result<ApiResponse, ApiError> {
        let response = self.execute(builder).await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), "request failed");
            return Err(ApiError::Status { status: status.as_u16(), body: text.trim().to_owned() });
        }
        Ok(ApiResponse { status: status.as_u16(), body: parse_body(&text) })
    }

    /// Send an optional JSON body to `path`.
    pub async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<ApiResponse, ApiError> {
        let request = self.request(method, path);
        let request = if let Some(json) = body { request.json(json) } else { request };
        self.dispatch(request).await
    }

    /// Send and deserialize the 2xx body as `T`.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<T, ApiError> {
        self.send(method, path, body).await?.json()
    }

    /// Send a urlencoded form.
    pub async fn send_form(
        &self,
        method: Method,
        path: &str,
        form: &[(&'static str, String)],
    ) -> Result<ApiResponse, ApiError> {
        self.dispatch(self.request(method, path).form(form)).await
    }

    /// GET `path` and return the raw 2xx body.
    pub async fn get_bytes(&self, path: &str) -> Result<Vec<u8>, ApiError> {
        let response = self.execute(self.request(Method::GET, path)).await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            return Err(ApiError::Status { status: status.as_u16(), body: body.trim().to_owned() });
        }
        Ok(response.bytes().await?.to_vec())
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("request_interceptors", &self.request_interceptors.len())
            .field("response_interceptors", &self.response_interceptors.len())
            .finish_non_exhaustive()
    }
}

pub(crate) fn parse_body(text: &str) -> Value {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    serde_json::from_str(trimmed).unwrap_or_else(|_| Value::String(trimmed.to_owned()))
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod pipeline_test;
