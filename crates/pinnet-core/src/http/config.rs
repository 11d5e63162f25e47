//! Client configuration: timeouts, TLS floor and user agent

use std::time::Duration;

use rustls::SupportedProtocolVersion;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Configuration for [`crate::RequestClient`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpClientConfig {
    pub timeouts: TimeoutConfig,
    pub tls: TlsConfig,
    /// Overrides the generated `User-Agent` header
    pub user_agent: Option<String>,
}

impl HttpClientConfig {
    pub fn validate(&self) -> Result<()> {
        self.timeouts.validate()?;
        self.tls.validate()?;

        if let Some(user_agent) = &self.user_agent {
            if user_agent.trim().is_empty() {
                return Err(Error::configuration("User agent override cannot be empty"));
            }
        }

        Ok(())
    }
}

/// Timeouts in whole seconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Time allowed to establish a connection, TLS handshake included
    pub connect_timeout_secs: u64,
    /// Total time allowed for a single request
    pub request_timeout_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
        }
    }
}

impl TimeoutConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.connect_timeout_secs == 0 {
            return Err(Error::configuration("Connect timeout cannot be zero"));
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::configuration("Request timeout cannot be zero"));
        }
        if self.connect_timeout_secs > self.request_timeout_secs {
            return Err(Error::configuration(
                "Connect timeout cannot be greater than request timeout",
            ));
        }
        Ok(())
    }
}

/// TLS settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TlsConfig {
    /// Lowest protocol version the client will negotiate
    pub min_tls_version: TlsVersion,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            min_tls_version: TlsVersion::TLS1_2,
        }
    }
}

impl TlsConfig {
    pub fn validate(&self) -> Result<()> {
        if self.min_tls_version < TlsVersion::TLS1_2 {
            return Err(Error::configuration(format!(
                "Minimum TLS version {} is below TLS 1.2",
                self.min_tls_version
            )));
        }
        Ok(())
    }
}

/// TLS protocol versions
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TlsVersion {
    /// TLS 1.0 (refused by validation)
    TLS1_0,
    /// TLS 1.1 (refused by validation)
    TLS1_1,
    TLS1_2,
    TLS1_3,
}

static TLS13_ONLY: &[&SupportedProtocolVersion] = &[&rustls::version::TLS13];

impl TlsVersion {
    /// Protocol versions rustls may negotiate with this floor
    pub fn protocol_versions(&self) -> &'static [&'static SupportedProtocolVersion] {
        match self {
            TlsVersion::TLS1_3 => TLS13_ONLY,
            _ => rustls::ALL_VERSIONS,
        }
    }
}

impl std::fmt::Display for TlsVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TlsVersion::TLS1_0 => "TLS 1.0",
            TlsVersion::TLS1_1 => "TLS 1.1",
            TlsVersion::TLS1_2 => "TLS 1.2",
            TlsVersion::TLS1_3 => "TLS 1.3",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = HttpClientConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tls.min_tls_version, TlsVersion::TLS1_2);
        assert_eq!(config.timeouts.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_old_tls_versions_are_refused() {
        for version in [TlsVersion::TLS1_0, TlsVersion::TLS1_1] {
            let tls = TlsConfig {
                min_tls_version: version,
            };
            assert!(tls.validate().unwrap_err().is_configuration());
        }
        assert!(TlsConfig { min_tls_version: TlsVersion::TLS1_3 }.validate().is_ok());
    }

    #[test]
    fn test_zero_timeouts_are_refused() {
        let timeouts = TimeoutConfig {
            connect_timeout_secs: 0,
            ..TimeoutConfig::default()
        };
        assert!(timeouts.validate().is_err());

        let timeouts = TimeoutConfig {
            connect_timeout_secs: 5,
            request_timeout_secs: 0,
        };
        assert!(timeouts.validate().is_err());
    }

    #[test]
    fn test_blank_user_agent_is_refused() {
        let config = HttpClientConfig {
            user_agent: Some("  ".to_string()),
            ..HttpClientConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_protocol_versions() {
        assert_eq!(TlsVersion::TLS1_3.protocol_versions().len(), 1);
        assert_eq!(
            TlsVersion::TLS1_3.protocol_versions()[0].version,
            rustls::ProtocolVersion::TLSv1_3
        );
        assert_eq!(TlsVersion::TLS1_2.protocol_versions().len(), 2);
    }

    #[test]
    fn test_partial_config_deserializes_with_defaults() {
        let config: HttpClientConfig =
            serde_json::from_str(r#"{"tls": {"min_tls_version": "TLS1_3"}}"#).unwrap();
        assert_eq!(config.tls.min_tls_version, TlsVersion::TLS1_3);
        assert_eq!(config.timeouts, TimeoutConfig::default());
        assert!(config.user_agent.is_none());
    }
}
