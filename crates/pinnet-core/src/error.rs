//! Error types for the Pinnet core library
//!
//! Errors are grouped by how a caller reacts to them: configuration errors are fatal,
//! server and decode errors are protocol failures of a single call, and transport
//! errors are handed through from the network layer unchanged.

use thiserror::Error;

use crate::http::server_error::ServerError;
use crate::http::transport::TransportError;
use crate::pinning::store::CertificateStoreError;

/// Main error type for Pinnet operations
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid client configuration
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// Pinned certificate material is missing or has been tampered with
    #[error("Certificate store error: {0}")]
    CertificateStore(#[from] CertificateStoreError),

    /// An authorized request was made on a client without a token source
    #[error("Authorization provider not present")]
    AuthorizationProviderNotPresent,

    /// The token source failed to produce a bearer token
    #[error("Authorization failed: {message}")]
    Authorization {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// The server answered with a status outside 200..300
    #[error(transparent)]
    Server(#[from] ServerError),

    /// The token exchange endpoint returned a body that is not a service token
    #[error("Unable to decode service token response: {source}")]
    UnableToDecodeServiceTokenResponse {
        #[source]
        source: serde_json::Error,
    },

    /// Network level failure (DNS, TLS handshake, timeout, connection reset)
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A request could not be constructed
    #[error("HTTP request error: {message}")]
    HttpRequest {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a configuration error without a source
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            source: None,
        }
    }

    /// Create an authorization error without a source
    pub fn authorization(message: impl Into<String>) -> Self {
        Self::Authorization {
            message: message.into(),
            source: None,
        }
    }

    /// Whether this error stems from setup rather than from a single request
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::Configuration { .. }
                | Error::CertificateStore(_)
                | Error::AuthorizationProviderNotPresent
        )
    }

    /// The structured server error, if the call failed on a non-2xx status
    pub fn server_error(&self) -> Option<&ServerError> {
        match self {
            Error::Server(error) => Some(error),
            _ => None,
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Authorization {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::configuration("timeout must be positive");
        assert_eq!(err.to_string(), "Configuration error: timeout must be positive");

        let err = Error::AuthorizationProviderNotPresent;
        assert_eq!(err.to_string(), "Authorization provider not present");
    }

    #[test]
    fn test_configuration_classification() {
        assert!(Error::AuthorizationProviderNotPresent.is_configuration());
        assert!(Error::configuration("bad").is_configuration());
        assert!(!Error::authorization("denied").is_configuration());

        let server = Error::from(ServerError::new(Some("users".to_string()), 500));
        assert!(!server.is_configuration());
        assert_eq!(server.server_error().map(|e| e.error_code), Some(500));
    }

    #[test]
    fn test_anyhow_conversion_is_authorization() {
        let err: Error = anyhow::anyhow!("identity provider unavailable").into();
        assert!(matches!(err, Error::Authorization { .. }));
        assert!(err.to_string().contains("identity provider unavailable"));
    }
}
