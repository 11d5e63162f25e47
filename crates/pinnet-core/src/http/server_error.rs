//! Structured server errors with a deterministic correlation hash
//!
//! The hash lets monitoring aggregate error rates per `(status, endpoint)` pair
//! without shipping raw endpoint strings.

use std::collections::BTreeMap;
use std::fmt;

use url::Url;

use crate::pinning::sha256_hex;

/// Reason recorded for every [`ServerError`]
pub const SERVER_ERROR_REASON: &str = "server";

/// Hex SHA-256 of `"{error_code}_{endpoint}"`; `None` when there is no endpoint
pub fn compute_error_hash(error_code: u16, endpoint: Option<&str>) -> Option<String> {
    endpoint.map(|endpoint| sha256_hex(format!("{}_{}", error_code, endpoint).as_bytes()))
}

/// The last non-empty path segment of `url`
pub fn endpoint_from_url(url: &Url) -> Option<String> {
    url.path_segments()?
        .rev()
        .find(|segment| !segment.is_empty())
        .map(str::to_string)
}

/// An error carrying an HTTP status and the endpoint it was returned from
pub trait ErrorWithCode {
    fn error_code(&self) -> u16;

    fn endpoint(&self) -> Option<&str>;

    /// Correlation hash, present iff [`ErrorWithCode::endpoint`] is
    fn hash(&self) -> Option<String>;
}

/// A response outside the 2xx range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerError {
    pub endpoint: Option<String>,
    pub error_code: u16,
}

impl ServerError {
    pub fn new(endpoint: Option<String>, error_code: u16) -> Self {
        Self { endpoint, error_code }
    }

    /// Build the error for a response to `url`
    pub fn for_url(url: &Url, error_code: u16) -> Self {
        Self::new(endpoint_from_url(url), error_code)
    }

    pub fn reason(&self) -> &'static str {
        SERVER_ERROR_REASON
    }

    /// Flat map for external log and monitoring collectors
    pub fn parameters(&self) -> BTreeMap<&'static str, String> {
        BTreeMap::from([
            ("endpoint", self.endpoint().unwrap_or("unknown").to_string()),
            ("code", self.error_code.to_string()),
            ("hash", self.hash().unwrap_or_else(|| "no hash".to_string())),
            ("reason", SERVER_ERROR_REASON.to_string()),
        ])
    }
}

impl ErrorWithCode for ServerError {
    fn error_code(&self) -> u16 {
        self.error_code
    }

    fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    fn hash(&self) -> Option<String> {
        compute_error_hash(self.error_code, self.endpoint())
    }
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.endpoint {
            Some(endpoint) => write!(f, "Server returned {} for '{}'", self.error_code, endpoint),
            None => write!(f, "Server returned {}", self.error_code),
        }
    }
}

impl std::error::Error for ServerError {}
