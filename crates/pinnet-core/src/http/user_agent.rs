//! `User-Agent` header value

use std::fmt;

const UNKNOWN_APP_NAME: &str = "Unknown_name";

/// Identifies the calling application and platform, e.g. `my_app/1.2.0 linux/x86_64`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAgent {
    app_name: Option<String>,
    app_version: String,
    os: String,
    arch: String,
}

impl UserAgent {
    /// User agent for `app_name` on the current platform
    pub fn new(app_name: Option<&str>, app_version: impl Into<String>) -> Self {
        Self {
            app_name: app_name.map(str::to_string),
            app_version: app_version.into(),
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
        }
    }

    pub fn with_platform(mut self, os: impl Into<String>, arch: impl Into<String>) -> Self {
        self.os = os.into();
        self.arch = arch.into();
        self
    }

    /// App name with whitespace replaced, so the product token stays a single token
    pub fn product(&self) -> String {
        match self.app_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.replace(char::is_whitespace, "_"),
            _ => UNKNOWN_APP_NAME.to_string(),
        }
    }
}

impl Default for UserAgent {
    fn default() -> Self {
        Self::new(Some("pinnet"), crate::VERSION)
    }
}

impl fmt::Display for UserAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} {}/{}", self.product(), self.app_version, self.os, self.arch)
    }
}
