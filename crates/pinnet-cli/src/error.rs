//! Error types and handling for the CLI

use std::io;
use std::path::PathBuf;

use pinnet_core::ErrorWithCode;

use crate::logging::redaction;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for CLI operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error (file operations, etc.)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Error from pinnet-core library
    #[error("{0}")]
    Core(#[from] pinnet_core::Error),

    /// File not found
    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// Invalid file format
    #[error("Invalid file format for {}: expected {} format", path.display(), expected)]
    InvalidFormat { path: PathBuf, expected: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid argument combination
    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Generic error with context
    #[error("{message}")]
    Other { message: String },
}

impl From<pinnet_core::CertificateStoreError> for Error {
    fn from(err: pinnet_core::CertificateStoreError) -> Self {
        Self::Core(err.into())
    }
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an invalid arguments error
    pub fn invalid_args(message: impl Into<String>) -> Self {
        Self::InvalidArgs(message.into())
    }

    /// Create a generic error with message
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Io(_) => 1,
            Self::Core(pinnet_core::Error::Server(_)) => 3,
            Self::Core(pinnet_core::Error::Transport(e)) if e.is_tls() => 4,
            Self::Core(pinnet_core::Error::Transport(_)) => 10,
            Self::Core(e) if e.is_configuration() => 5,
            Self::Core(_) => 2,
            Self::FileNotFound { .. } => 6,
            Self::InvalidFormat { .. } => 7,
            Self::Config(_) => 5,
            Self::InvalidArgs(_) => 8,
            Self::Json(_) => 12,
            Self::Yaml(_) => 13,
            Self::Other { .. } => 99,
        }
    }

    /// Check if this error should display usage help
    pub fn should_show_help(&self) -> bool {
        matches!(self, Self::InvalidArgs(_))
    }
}

/// Format an error for display to the user
///
/// Server errors are followed by their log parameters. Token-like values are masked.
pub fn format_error(error: &Error, use_color: bool) -> String {
    let message = redaction::redact_sensitive(&error.to_string());

    let mut formatted = if use_color {
        use colored::Colorize;
        format!("{} {}", "Error:".red().bold(), message)
    } else {
        format!("Error: {}", message)
    };

    if let Error::Core(pinnet_core::Error::Server(server)) = error {
        formatted.push_str(&format!(
            "\n  code: {}\n  endpoint: {}\n  hash: {}",
            server.error_code(),
            server.endpoint().unwrap_or("unknown"),
            server.hash().unwrap_or_else(|| "no hash".to_string()),
        ));
    }

    formatted
}

#[cfg(test)]
mod tests {
    use super::*;
    use pinnet_core::{ServerError, TransportError, TransportErrorKind};

    #[test]
    fn test_exit_codes() {
        let server: Error = pinnet_core::Error::from(ServerError::new(None, 500)).into();
        assert_eq!(server.exit_code(), 3);

        let tls = TransportError::new(TransportErrorKind::Tls, "pinning rejected");
        let tls: Error = pinnet_core::Error::from(tls).into();
        assert_eq!(tls.exit_code(), 4);

        let missing: Error = pinnet_core::Error::AuthorizationProviderNotPresent.into();
        assert_eq!(missing.exit_code(), 5);

        assert_eq!(Error::invalid_args("bad").exit_code(), 8);
        assert!(Error::invalid_args("bad").should_show_help());
    }

    #[test]
    fn test_format_server_error() {
        let error: Error =
            pinnet_core::Error::from(ServerError::new(Some("users".to_string()), 404)).into();
        let formatted = format_error(&error, false);

        assert!(formatted.starts_with("Error: Server returned 404 for 'users'"));
        assert!(formatted.contains(
            "hash: 5103ce5c321c6cfec6ff64d8346575907c944453d5e1ad8b569b52cf9a4039b2"
        ));
    }

    #[test]
    fn test_format_masks_tokens() {
        let error = Error::other("provider rejected token=abcdefghijklmnop");
        let formatted = format_error(&error, false);
        assert!(!formatted.contains("abcdefghijklmnop"));
    }
}
