//! Outbound HTTP to the file-sharing backend.
//!
//! ARCHITECTURE
//! ============
//! `pipeline::ApiClient` is the only place requests are dispatched. It runs
//! the request interceptor chain (credential first) immediately before each
//! send, then the response interceptor chain. `api` holds one thin function
//! per backend route on top of it, and `types` the wire DTOs.
//!
//! ERROR HANDLING
//! ==============
//! Every failure reaches the caller as an `ApiError`; nothing is retried.
//! Non-2xx responses, 401/403 included, become `ApiError::Status`.

pub mod api;
pub mod interceptor;
pub mod pipeline;
pub mod types;

pub use interceptor::{CredentialInterceptor, RequestInterceptor, ResponseInterceptor};
pub use pipeline::{ApiClient, ApiResponse};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("cannot attach credential: {0}")]
    Credential(String),
    #[error("invalid base URL: {0}")]
    InvalidUrl(String),
    #[error("failed to build HTTP client: {0}")]
    HttpClientBuild(String),
    #[error("http request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unexpected response body: {0}")]
    Decode(String),
    #[error("response rejected: {0}")]
    Rejected(String),
    #[error("{context}: {source}")]
    Io { context: String, source: std::io::Error },
}

impl ApiError {
    /// HTTP status for `Status` errors.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the backend refused the credential (401) or the action (403).
    #[must_use]
    pub fn is_auth_failure(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }
}
