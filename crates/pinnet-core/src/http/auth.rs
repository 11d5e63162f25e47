//! Bearer token capabilities and header attachment
//!
//! Two injected capabilities feed the authorization flows:
//! - [`AuthorizationProvider`]: scope in, bearer token out (opaque provider flow)
//! - [`SubjectTokenProvider`]: the caller's own token, traded in a token exchange

use std::fmt;

use async_trait::async_trait;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::Request;

use crate::{Error, Result};

/// Produces a bearer token for a scope
#[async_trait]
pub trait AuthorizationProvider: fmt::Debug + Send + Sync {
    async fn fetch_token(&self, scope: &str) -> anyhow::Result<String>;
}

/// Produces the subject token presented to a token exchange endpoint
#[async_trait]
pub trait SubjectTokenProvider: fmt::Debug + Send + Sync {
    async fn subject_token(&self) -> anyhow::Result<String>;
}

/// Fixed token for every scope
#[derive(Clone)]
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }

    /// Create from environment variable
    pub fn from_env(var: &str) -> Result<Self> {
        match std::env::var(var) {
            Ok(token) if !token.is_empty() => Ok(Self::new(token)),
            _ => Err(Error::configuration(format!(
                "Bearer token not found. Set {} environment variable",
                var
            ))),
        }
    }
}

impl fmt::Debug for StaticTokenProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticTokenProvider")
            .field("token", &"<redacted>")
            .finish()
    }
}

#[async_trait]
impl AuthorizationProvider for StaticTokenProvider {
    async fn fetch_token(&self, _scope: &str) -> anyhow::Result<String> {
        Ok(self.token.clone())
    }
}

#[async_trait]
impl SubjectTokenProvider for StaticTokenProvider {
    async fn subject_token(&self) -> anyhow::Result<String> {
        Ok(self.token.clone())
    }
}

/// `request` with `Authorization: Bearer <token>`, replacing any existing value
pub fn authorized(mut request: Request, token: &str) -> Result<Request> {
    let mut value = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|e| Error::HttpRequest {
        message: "Bearer token is not a valid header value".to_string(),
        source: Some(Box::new(e)),
    })?;
    value.set_sensitive(true);

    request.headers_mut().insert(AUTHORIZATION, value);
    Ok(request)
}
