//! Server configuration

use std::path::Path;

use serde::{Deserialize, Serialize};
use sysprop_core::error::{ConfigError, CoreError};

/// Default tracing directives when neither `RUST_LOG` nor the config file
/// provide any
pub const DEFAULT_LOG_FILTER: &str =
    "sysprop_core=info,sysprop_api=info,sysprop_server=debug,tower_http=debug";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server bind address (e.g., "127.0.0.1:5000")
    pub bind_address: String,

    /// Largest accepted request body, in bytes
    pub max_body_bytes: usize,

    /// File name stem for downloadable formats (`<stem>.xlsx` etc.)
    pub download_stem: String,

    /// `tracing_subscriber::EnvFilter` directives
    pub log_filter: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:5000".to_string(),
            max_body_bytes: 1024 * 1024,
            download_stem: "sysprop".to_string(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from a TOML file. Missing fields take their
    /// defaults.
    pub async fn load(path: &Path) -> Result<Self, CoreError> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            CoreError::ConfigurationError {
                config_path: path.display().to_string(),
                field: "file".to_string(),
                expected: "readable TOML file".to_string(),
                cause: ConfigError::Io(e.to_string()),
            }
        })?;
        Self::from_toml(&content, &path.display().to_string())
    }

    /// Parse and validate configuration text; `config_path` is only used in
    /// error reports.
    pub fn from_toml(content: &str, config_path: &str) -> Result<Self, CoreError> {
        let config: ServerConfig =
            toml::from_str(content).map_err(|e| CoreError::ConfigurationError {
                config_path: config_path.to_string(),
                field: "content".to_string(),
                expected: "valid TOML configuration".to_string(),
                cause: ConfigError::TomlParse(e.to_string()),
            })?;
        config.validate(config_path)?;
        Ok(config)
    }

    fn validate(&self, config_path: &str) -> Result<(), CoreError> {
        let invalid = |field: &str, expected: &str, value: String| CoreError::ConfigurationError {
            config_path: config_path.to_string(),
            field: field.to_string(),
            expected: expected.to_string(),
            cause: ConfigError::InvalidValue(value),
        };

        if self.max_body_bytes == 0 {
            return Err(invalid(
                "max_body_bytes",
                "a positive number of bytes",
                self.max_body_bytes.to_string(),
            ));
        }
        let stem_ok = !self.download_stem.is_empty()
            && self
                .download_stem
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.');
        if !stem_ok {
            return Err(invalid(
                "download_stem",
                "a non-empty file name of letters, digits, '.', '_' or '-'",
                self.download_stem.clone(),
            ));
        }
        Ok(())
    }
}
