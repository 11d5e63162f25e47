//! Configuration management for the CLI
//!
//! Configuration is read from an explicit file or the first default location
//! that exists. Files are YAML (`.yaml`/`.yml`) or JSON.

use crate::error::{Error, Result};
use pinnet_core::HttpClientConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Pinned client settings
    pub client: HttpClientConfig,

    /// Token exchange defaults for authorized fetches
    pub token_exchange: TokenExchangeSection,

    /// Logging settings
    pub logging: LoggingSection,
}

/// Token exchange defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenExchangeSection {
    /// Exchange endpoint URL
    pub endpoint: Option<String>,

    /// Scope requested when `--scope` is not given
    pub scope: Option<String>,
}

impl TokenExchangeSection {
    pub fn endpoint_url(&self) -> Result<Option<Url>> {
        self.endpoint
            .as_deref()
            .map(|endpoint| {
                Url::parse(endpoint).map_err(|e| {
                    Error::config(format!("Invalid token exchange endpoint '{}': {}", endpoint, e))
                })
            })
            .transpose()
    }
}

/// Logging configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level (trace, debug, info, warn, error)
    pub level: Option<String>,

    /// Log format (compact, full, json)
    pub format: Option<String>,
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let config = Self::parse_file(path)?;
        config.client.validate()?;
        Ok(config)
    }

    /// Read and deserialize a file without validating the client section
    fn parse_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path)?;

        let is_yaml = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s == "yaml" || s == "yml")
            .unwrap_or(false);

        let config: Self = if is_yaml {
            serde_yaml::from_str(&content).map_err(|_| Error::InvalidFormat {
                path: path.to_path_buf(),
                expected: "YAML".to_string(),
            })?
        } else {
            serde_json::from_str(&content).map_err(|_| Error::InvalidFormat {
                path: path.to_path_buf(),
                expected: "JSON".to_string(),
            })?
        };

        Ok(config)
    }

    /// Load configuration from a specific file or default locations
    pub fn load_with_file(file: Option<&Path>) -> Result<Self> {
        match Self::resolve_path(file) {
            Some(path) => Self::from_file(&path),
            None => Ok(Self::default()),
        }
    }

    /// The logging section of the file `load_with_file` would read
    ///
    /// Used when the full configuration is rejected, so a file with an invalid client
    /// section still controls how that rejection is logged. Unreadable files yield defaults.
    pub fn logging_with_file(file: Option<&Path>) -> LoggingSection {
        Self::resolve_path(file)
            .and_then(|path| Self::parse_file(&path).ok())
            .map(|config| config.logging)
            .unwrap_or_default()
    }

    fn resolve_path(file: Option<&Path>) -> Option<PathBuf> {
        match file {
            Some(path) => Some(path.to_path_buf()),
            None => Self::default_config_paths().into_iter().find(|path| path.exists()),
        }
    }

    /// Default configuration file paths, in lookup order
    fn default_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from(".pinnet.yaml"),
            PathBuf::from(".pinnet.json"),
        ];

        if let Some(config_dir) = dirs::config_dir() {
            let pinnet_dir = config_dir.join("pinnet");
            paths.push(pinnet_dir.join("config.yaml"));
            paths.push(pinnet_dir.join("config.json"));
        }

        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".pinnet.yaml"));
            paths.push(home_dir.join(".pinnet.json"));
        }

        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pinnet_core::TlsVersion;
    use tempfile::TempDir;

    #[test]
    fn test_load_yaml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pinnet.yaml");
        std::fs::write(
            &path,
            r#"
client:
  timeouts:
    connect_timeout_secs: 5
    request_timeout_secs: 20
  tls:
    min_tls_version: TLS1_3
token_exchange:
  endpoint: https://auth.example.com/oauth2/token
  scope: read:orders
logging:
  level: debug
"#,
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.client.timeouts.connect_timeout_secs, 5);
        assert_eq!(config.client.tls.min_tls_version, TlsVersion::TLS1_3);
        assert_eq!(config.token_exchange.scope.as_deref(), Some("read:orders"));
        assert_eq!(
            config.token_exchange.endpoint_url().unwrap().map(|u| u.to_string()),
            Some("https://auth.example.com/oauth2/token".to_string())
        );
        assert_eq!(config.logging.level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_load_json_with_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pinnet.json");
        std::fs::write(&path, r#"{"client": {"user_agent": "probe/1.0"}}"#).unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.client.user_agent.as_deref(), Some("probe/1.0"));
        assert_eq!(config.client.tls.min_tls_version, TlsVersion::TLS1_2);
        assert!(config.token_exchange.endpoint.is_none());
    }

    #[test]
    fn test_insecure_tls_floor_is_refused() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pinnet.yaml");
        std::fs::write(&path, "client:\n  tls:\n    min_tls_version: TLS1_0\n").unwrap();

        let error = Config::from_file(&path).unwrap_err();
        assert_eq!(error.exit_code(), 5);
    }

    #[test]
    fn test_rejected_file_still_provides_logging() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pinnet.yaml");
        std::fs::write(
            &path,
            "client:\n  tls:\n    min_tls_version: TLS1_1\nlogging:\n  level: debug\n  format: json\n",
        )
        .unwrap();

        assert!(Config::load_with_file(Some(&path)).is_err());
        let logging = Config::logging_with_file(Some(&path));
        assert_eq!(logging.level.as_deref(), Some("debug"));
        assert_eq!(logging.format.as_deref(), Some("json"));
    }

    #[test]
    fn test_unreadable_file_logging_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();

        let logging = Config::logging_with_file(Some(&path));
        assert!(logging.level.is_none());
        assert!(logging.format.is_none());
    }

    #[test]
    fn test_missing_and_malformed_files() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            Config::from_file(&dir.path().join("absent.yaml")),
            Err(Error::FileNotFound { .. })
        ));

        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(Config::from_file(&path), Err(Error::InvalidFormat { .. })));
    }

    #[test]
    fn test_invalid_exchange_endpoint() {
        let section = TokenExchangeSection {
            endpoint: Some("not a url".to_string()),
            scope: None,
        };
        assert!(matches!(section.endpoint_url(), Err(Error::Config(_))));
    }
}
