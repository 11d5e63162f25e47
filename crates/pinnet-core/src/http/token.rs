//! OAuth2 token exchange and bearer token sources

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::{Body, Method, Request};
use serde::{Deserialize, Serialize};
use url::Url;

use super::auth::{AuthorizationProvider, SubjectTokenProvider};
use crate::{Error, Result};

pub const GRANT_TYPE_TOKEN_EXCHANGE: &str = "urn:ietf:params:oauth:grant-type:token-exchange";
pub const TOKEN_TYPE_ACCESS_TOKEN: &str = "urn:ietf:params:oauth:token-type:access_token";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Token exchange endpoint response
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceTokenResponse {
    pub access_token: String,
    pub token_type: String,
    /// Lifetime in seconds
    pub expires_in: u64,
}

impl ServiceTokenResponse {
    /// Expiry for a token issued at `issued_at`; `None` if it does not fit in a timestamp
    pub fn expires_at(&self, issued_at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let seconds = i64::try_from(self.expires_in).ok()?;
        issued_at.checked_add_signed(TimeDelta::try_seconds(seconds)?)
    }
}

impl fmt::Debug for ServiceTokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceTokenResponse")
            .field("access_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// Decode a token exchange response body
pub fn decode_service_token(body: &[u8]) -> Result<ServiceTokenResponse> {
    serde_json::from_slice(body).map_err(|source| Error::UnableToDecodeServiceTokenResponse { source })
}

/// An OAuth2 token exchange endpoint and the subject token traded there
#[derive(Debug, Clone)]
pub struct TokenExchange {
    endpoint: Url,
    subject_tokens: Arc<dyn SubjectTokenProvider>,
}

impl TokenExchange {
    pub fn new(endpoint: Url, subject_tokens: Arc<dyn SubjectTokenProvider>) -> Self {
        Self {
            endpoint,
            subject_tokens,
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// The form-encoded exchange POST for `scope`
    pub async fn request(&self, scope: &str) -> Result<Request> {
        let subject_token = self.subject_tokens.subject_token().await?;

        let body = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("grant_type", GRANT_TYPE_TOKEN_EXCHANGE)
            .append_pair("scope", scope)
            .append_pair("subject_token", &subject_token)
            .append_pair("subject_token_type", TOKEN_TYPE_ACCESS_TOKEN)
            .finish();

        let mut request = Request::new(Method::POST, self.endpoint.clone());
        request
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));
        *request.body_mut() = Some(Body::from(body));

        Ok(request)
    }
}

/// Where [`crate::RequestClient::make_authorized_request`] gets its bearer token
#[derive(Debug, Clone)]
pub enum TokenSource {
    /// Opaque provider: scope in, token out
    Provider(Arc<dyn AuthorizationProvider>),
    /// Explicit two-step OAuth2 token exchange
    Exchange(TokenExchange),
}

impl From<TokenExchange> for TokenSource {
    fn from(exchange: TokenExchange) -> Self {
        TokenSource::Exchange(exchange)
    }
}
