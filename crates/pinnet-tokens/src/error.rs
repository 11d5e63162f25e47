//! Error types for JWT assembly

use thiserror::Error;

/// Errors raised while building a token
#[derive(Error, Debug)]
pub enum JwtError {
    /// Header or payload could not be serialized to JSON
    #[error("Failed to serialize JWT {part}: {source}")]
    Serialization {
        part: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The signing service refused or failed to sign
    #[error("Failed to sign JWT: {message}")]
    Signing {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, JwtError>;

impl JwtError {
    pub fn signing(message: impl Into<String>) -> Self {
        Self::Signing {
            message: message.into(),
            source: None,
        }
    }
}
