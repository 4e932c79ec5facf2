//! Configuration management for racecard
//!
//! This module handles loading and validating configuration from a TOML file,
//! environment variables and command-line arguments. Every section has
//! defaults, so a config file only needs the values it changes.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::models::ManifestFormat;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse TOML config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the manifest comes from
    pub source: SourceConfig,

    /// Selection key handling
    pub selection: SelectionConfig,

    /// Page text
    pub site: SiteConfig,

    /// HTTP server
    pub server: ServerConfig,

    /// Static export
    pub export: ExportConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// How candidate locations are retrieved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Read candidates from `public_dir`
    #[default]
    File,
    /// Fetch candidates over HTTP relative to `base_url`
    Http,
}

/// Manifest source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Transport used for candidates
    pub transport: TransportKind,

    /// Absolute base URL candidates are resolved against (http transport)
    pub base_url: String,

    /// Root directory for the file transport and for served static assets
    pub public_dir: PathBuf,

    /// Candidate locations, tried in order
    pub candidates: Vec<CandidateConfig>,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,

    /// User agent string
    pub user_agent: String,
}

/// One candidate location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateConfig {
    pub location: String,
    #[serde(default)]
    pub format: ManifestFormat,
}

/// Selection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Query parameter carrying the selected race id
    pub query_param: String,
}

/// Page text configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub title: String,
    /// Shown instead of the race card when no manifest could be resolved
    pub empty_message: String,
    pub disclaimer: String,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server bind address
    pub bind_address: SocketAddr,

    /// Enable CORS for API
    pub enable_cors: bool,

    /// Enable request logging
    pub enable_request_logging: bool,
}

/// Static export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub output_dir: PathBuf,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            transport: TransportKind::File,
            base_url: String::from("http://localhost:8080"),
            public_dir: PathBuf::from("public"),
            candidates: vec![
                CandidateConfig {
                    location: String::from("/data/races.json"),
                    format: ManifestFormat::Races,
                },
                CandidateConfig {
                    location: String::from("/data/predictions.json"),
                    format: ManifestFormat::LegacyPredictions,
                },
            ],
            request_timeout_secs: 10,
            user_agent: format!("racecard/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            query_param: String::from("raceId"),
        }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: String::from("AI予想"),
            empty_message: String::from(
                "public/data/races.json を置くと表示されます。",
            ),
            disclaimer: String::from(
                "※本サイトは情報提供を目的としています。詳細データはリンク先をご確認ください。",
            ),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 8080)),
            enable_cors: true,
            enable_request_logging: true,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("out"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

impl Config {
    /// Load configuration from environment variables on top of defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from an optional file, then apply environment overrides and validate
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Override values from `RACECARD_*` environment variables
    ///
    /// Setting `RACECARD_BASE_URL` also switches the transport to HTTP.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(base_url) = std::env::var("RACECARD_BASE_URL") {
            self.source.base_url = base_url;
            self.source.transport = TransportKind::Http;
        }

        if let Ok(transport) = std::env::var("RACECARD_TRANSPORT") {
            self.source.transport = match transport.as_str() {
                "file" => TransportKind::File,
                "http" => TransportKind::Http,
                other => {
                    return Err(ConfigError::InvalidValue {
                        field: "RACECARD_TRANSPORT".to_string(),
                        reason: format!("expected file or http, got {other}"),
                    })
                }
            };
        }

        if let Ok(dir) = std::env::var("RACECARD_PUBLIC_DIR") {
            self.source.public_dir = PathBuf::from(dir);
        }

        if let Some(secs) = std::env::var("RACECARD_REQUEST_TIMEOUT")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            self.source.request_timeout_secs = secs;
        }

        if let Ok(user_agent) = std::env::var("RACECARD_USER_AGENT") {
            self.source.user_agent = user_agent;
        }

        if let Ok(param) = std::env::var("RACECARD_QUERY_PARAM") {
            self.selection.query_param = param;
        }

        if let Ok(addr) = std::env::var("RACECARD_BIND_ADDRESS") {
            self.server.bind_address = addr.parse().map_err(|_| ConfigError::InvalidValue {
                field: "RACECARD_BIND_ADDRESS".to_string(),
                reason: format!("Invalid address: {addr}"),
            })?;
        }

        if let Ok(dir) = std::env::var("RACECARD_OUTPUT_DIR") {
            self.export.output_dir = PathBuf::from(dir);
        }

        if let Ok(level) = std::env::var("RACECARD_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Ok(format) = std::env::var("RACECARD_LOG_FORMAT") {
            self.logging.format = format;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source.candidates.is_empty() {
            return Err(invalid("source.candidates", "At least one candidate is required"));
        }

        if self
            .source
            .candidates
            .iter()
            .any(|c| c.location.trim().is_empty())
        {
            return Err(invalid("source.candidates", "Candidate location must not be empty"));
        }

        if self.source.request_timeout_secs == 0 {
            return Err(invalid("source.request_timeout_secs", "Must be greater than 0"));
        }

        if self.source.transport == TransportKind::Http {
            let url = Url::parse(&self.source.base_url)
                .map_err(|e| invalid("source.base_url", &e.to_string()))?;
            if url.cannot_be_a_base() {
                return Err(invalid("source.base_url", "Must be an absolute base URL"));
            }
        }

        if self.selection.query_param.trim().is_empty() {
            return Err(invalid("selection.query_param", "Must not be empty"));
        }

        if !matches!(self.logging.format.as_str(), "text" | "json") {
            return Err(invalid("logging.format", "Expected text or json"));
        }

        Ok(())
    }

    /// Get request timeout as Duration
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.source.request_timeout_secs)
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_candidates_order() {
        let config = Config::default();
        let locations: Vec<&str> = config
            .source
            .candidates
            .iter()
            .map(|c| c.location.as_str())
            .collect();
        assert_eq!(locations, vec!["/data/races.json", "/data/predictions.json"]);
        assert_eq!(
            config.source.candidates[1].format,
            ManifestFormat::LegacyPredictions
        );
    }

    #[test]
    fn test_empty_candidates_invalid() {
        let mut config = Config::default();
        config.source.candidates.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_http_requires_absolute_base_url() {
        let mut config = Config::default();
        config.source.transport = TransportKind::Http;
        config.source.base_url = "/relative".to_string();
        assert!(config.validate().is_err());

        config.source.base_url = "https://keiba.example.com/app/".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_log_format() {
        let mut config = Config::default();
        config.logging.format = "xml".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [selection]
            query_param = "race"

            [[source.candidates]]
            location = "/predictions.json"
            format = "legacy-predictions"
            "#,
        )
        .unwrap();

        assert_eq!(config.selection.query_param, "race");
        assert_eq!(config.source.candidates.len(), 1);
        assert_eq!(config.source.request_timeout_secs, 10);
        assert_eq!(config.server.bind_address.port(), 8080);
    }

    #[test]
    fn test_request_timeout_conversion() {
        let config = Config::default();
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
    }
}
