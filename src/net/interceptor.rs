//! Hooks run by `ApiClient` around every dispatch.
//!
//! SYSTEM CONTEXT
//! ==============
//! `CredentialInterceptor` is installed by `ApiClient::new` ahead of anything
//! a caller adds, so call sites never touch the `Authorization` header.
//! Response interceptors exist as a seam only; none ship enabled, so a 401
//! does not sign the user out on its own.

use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, HeaderValue};

use super::ApiError;
use crate::config::AuthScheme;
use crate::session::Session;

/// Mutates an outgoing request just before it is sent. An error aborts the
/// request; it is never dispatched.
pub trait RequestInterceptor: Send + Sync {
    fn intercept(&self, request: &mut reqwest::Request) -> Result<(), ApiError>;
}

/// Sees each response's status and headers before the body is read. An error
/// replaces the response for the caller.
pub trait ResponseInterceptor: Send + Sync {
    fn on_response(&self, response: &reqwest::Response) -> Result<(), ApiError>;
}

/// Attaches the session token as the `Authorization` header.
#[derive(Debug, Clone)]
pub struct CredentialInterceptor {
    session: Arc<Session>,
    scheme: AuthScheme,
}

impl CredentialInterceptor {
    #[must_use]
    pub fn new(session: Arc<Session>, scheme: AuthScheme) -> Self {
        Self { session, scheme }
    }
}

impl RequestInterceptor for CredentialInterceptor {
    fn intercept(&self, request: &mut reqwest::Request) -> Result<(), ApiError> {
        // Fail closed: an unreadable session must not degrade to an anonymous request.
        let token = self.session.token().map_err(|e| ApiError::Credential(e.to_string()))?;

        let headers = request.headers_mut();
        let Some(token) = token else {
            headers.remove(AUTHORIZATION);
            return Ok(());
        };

        let mut value = HeaderValue::from_str(&self.scheme.header_value(&token))
            .map_err(|_| ApiError::Credential("stored token is not a valid header value".to_owned()))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
        Ok(())
    }
}

#[cfg(test)]
#[path = "interceptor_test.rs"]
mod interceptor_test;
