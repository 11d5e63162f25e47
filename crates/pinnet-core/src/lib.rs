//! Pinnet Core - hardened HTTP client layer
//!
//! This crate layers three capabilities on top of a plain request/response transport:
//!
//! - **Certificate pinning**: every TLS handshake is checked against a fixed set of
//!   trusted certificates on top of the usual chain and hostname validation
//! - **Token exchange authorization**: bearer tokens are obtained from an injected
//!   provider or through an OAuth2 token exchange, then attached to the outgoing request
//! - **Structured server errors**: non-2xx responses become [`ServerError`] values with a
//!   deterministic hash suitable for log correlation
//!
//! # Example
//!
//! ```no_run
//! use pinnet_core::{HttpClientConfig, RequestClient, Result};
//! use reqwest::{Method, Request, Url};
//!
//! async fn example() -> Result<()> {
//!     let client = RequestClient::new(HttpClientConfig::default())?;
//!     let url = Url::parse("https://api.example.com/v1/status").expect("valid url");
//!     let body = client.make_request(Request::new(Method::GET, url)).await?;
//!     println!("{} bytes", body.len());
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod http;
pub mod pinning;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

// Re-export main types for convenience
pub use error::{Error, Result};
pub use http::{
    authorized, compute_error_hash, decode_service_token, is_successful,
    AuthorizationProvider, ErrorWithCode, HttpClientConfig, HttpResponse, ReqwestTransport,
    RequestClient, ServerError, ServiceTokenResponse, StaticTokenProvider, SubjectTokenProvider,
    TimeoutConfig, TlsConfig, TlsVersion, TokenExchange, TokenSource, Transport,
    TransportError, TransportErrorKind, UserAgent,
};
pub use pinning::{
    AuthenticationChallenge, CertificateBundle, CertificateStore, CertificateStoreError,
    ChallengeDisposition, Credential, DirectoryBundle, EmbeddedBundle, PinnedCertificate,
    PinnedRoot, PinningError, PinningValidator, PinningVerifier, ServerTrust, SslPolicy,
    TrustDecision, TrustEvaluator, WebPkiTrustEvaluator,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_error_creation() {
        let err = Error::Configuration {
            message: "Test error".to_string(),
            source: None,
        };
        assert!(err.to_string().contains("Test error"));
    }
}
