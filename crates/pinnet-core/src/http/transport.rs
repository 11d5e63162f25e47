//! The request/response transport seam
//!
//! [`RequestClient`](crate::RequestClient) only ever talks to a [`Transport`]. The
//! production implementation is [`ReqwestTransport`], whose TLS layer is governed by
//! the pinning verifier; tests substitute `testing::MockTransport`.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Client, Request};
use url::Url;

use super::config::HttpClientConfig;
use super::user_agent::UserAgent;
use crate::pinning::{pinned_client_config, CertificateStore, PinningValidator, WebPkiTrustEvaluator};
use crate::{Error, Result};

/// A fully received response
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, url: Url, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            url,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }
}

/// Broad classes of network failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    Connect,
    Timeout,
    /// Handshake refused, including pinning rejections
    Tls,
    /// Request could not be sent or the connection dropped mid-flight
    Request,
    /// Response body could not be read
    Body,
    Other,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransportErrorKind::Connect => "connect",
            TransportErrorKind::Timeout => "timeout",
            TransportErrorKind::Tls => "tls",
            TransportErrorKind::Request => "request",
            TransportErrorKind::Body => "body",
            TransportErrorKind::Other => "other",
        };
        f.write_str(name)
    }
}

/// Network level failure, passed to callers unchanged
#[derive(Debug, thiserror::Error)]
#[error("Transport error ({kind}): {message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
    #[source]
    pub source: Option<Box<dyn StdError + Send + Sync>>,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn is_tls(&self) -> bool {
        self.kind == TransportErrorKind::Tls
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        let kind = if error.is_timeout() {
            TransportErrorKind::Timeout
        } else if caused_by_tls(&error) {
            TransportErrorKind::Tls
        } else if error.is_connect() {
            TransportErrorKind::Connect
        } else if error.is_body() || error.is_decode() {
            TransportErrorKind::Body
        } else if error.is_request() {
            TransportErrorKind::Request
        } else {
            TransportErrorKind::Other
        };

        Self {
            kind,
            message: error.to_string(),
            source: Some(Box::new(error)),
        }
    }
}

/// rustls errors reach us wrapped in `io::Error` somewhere down the source chain
fn caused_by_tls(error: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(error);
    while let Some(error) = current {
        if error.is::<rustls::Error>() {
            return true;
        }
        if let Some(io) = error.downcast_ref::<std::io::Error>() {
            if io.get_ref().is_some_and(|inner| inner.is::<rustls::Error>()) {
                return true;
            }
        }
        current = error.source();
    }
    false
}

/// Sends a request and returns the complete response
#[async_trait]
pub trait Transport: fmt::Debug + Send + Sync {
    async fn send(&self, request: Request) -> std::result::Result<HttpResponse, TransportError>;
}

/// reqwest-backed transport
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Transport whose every TLS handshake is checked against `store`
    pub fn pinned(config: &HttpClientConfig, store: Arc<CertificateStore>) -> Result<Self> {
        config.validate()?;

        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let evaluator = WebPkiTrustEvaluator::new(&store, provider.clone())?;
        let validator = PinningValidator::new(Arc::new(evaluator), store);
        let tls = pinned_client_config(validator, provider, config.tls.min_tls_version)?;

        let user_agent = config
            .user_agent
            .clone()
            .unwrap_or_else(|| UserAgent::default().to_string());

        let client = Client::builder()
            .use_preconfigured_tls(tls)
            .connect_timeout(config.timeouts.connect_timeout())
            .timeout(config.timeouts.request_timeout())
            .user_agent(user_agent)
            .build()
            .map_err(|e| Error::HttpRequest {
                message: format!("Failed to create HTTP client: {}", e),
                source: Some(Box::new(e)),
            })?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: Request) -> std::result::Result<HttpResponse, TransportError> {
        let response = self.client.execute(request).await?;

        let status = response.status().as_u16();
        let url = response.url().clone();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();

        Ok(HttpResponse {
            status,
            url,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tls_cause_is_detected_through_io_error() {
        let tls = rustls::Error::General("certificate pinning: Server not trusted".to_string());
        let io = std::io::Error::new(std::io::ErrorKind::InvalidData, tls);
        assert!(caused_by_tls(&io));

        let plain = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        assert!(!caused_by_tls(&plain));
    }

    #[test]
    fn test_transport_error_display() {
        let error = TransportError::new(TransportErrorKind::Timeout, "deadline elapsed");
        assert_eq!(error.to_string(), "Transport error (timeout): deadline elapsed");
        assert!(!error.is_tls());
    }

    #[test]
    fn test_pinned_transport_builds_with_embedded_store() {
        let store = Arc::new(CertificateStore::embedded().unwrap());
        assert!(ReqwestTransport::pinned(&HttpClientConfig::default(), store).is_ok());
    }

    #[test]
    fn test_pinned_transport_refuses_invalid_config() {
        let store = Arc::new(CertificateStore::embedded().unwrap());
        let mut config = HttpClientConfig::default();
        config.tls.min_tls_version = crate::TlsVersion::TLS1_1;

        let error = ReqwestTransport::pinned(&config, store).unwrap_err();
        assert!(error.is_configuration());
    }
}
