//! Client configuration, loadable from TOML.

use crate::error::{ClientError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main client configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    pub transport: TransportSettings,
    pub logging: LoggingSettings,
}

/// Channel establishment settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TransportSettings {
    /// Timeout for binding the environment's channel, in milliseconds.
    /// Applies to connection establishment only; protocol operations carry
    /// no timeout of their own.
    pub connect_timeout_ms: u64,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 5_000,
        }
    }
}

/// Diagnostic logging settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ClientError::config(format!("failed to read config file: {}", e)))?;

        toml::from_str(&contents)
            .map_err(|e| ClientError::config(format!("failed to parse config: {}", e)))
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.transport.connect_timeout_ms == 0 {
            return Err(ClientError::config("connect_timeout_ms must be > 0"));
        }
        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            other => Err(ClientError::config(format!(
                "unknown log level: {}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = ClientConfig::default();
        assert_eq!(config.transport.connect_timeout_ms, 5_000);
        assert_eq!(config.logging.level, "info");
        config.validate().unwrap();
    }

    #[test]
    fn test_toml_round_trip() {
        let parsed: ClientConfig = toml::from_str(
            r#"
            [transport]
            connect_timeout_ms = 250

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(parsed.transport.connect_timeout_ms, 250);
        assert_eq!(parsed.logging.level, "debug");
        parsed.validate().unwrap();
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let parsed: ClientConfig = toml::from_str("[logging]\nlevel = \"warn\"\n").unwrap();
        assert_eq!(parsed.transport.connect_timeout_ms, 5_000);
        assert_eq!(parsed.logging.level, "warn");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = ClientConfig::default();
        config.transport.connect_timeout_ms = 0;
        assert!(config.validate().is_err());

        let mut config = ClientConfig::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.toml");
        std::fs::write(&path, "[transport]\nconnect_timeout_ms = 100\n").unwrap();

        let config = ClientConfig::from_file(&path).unwrap();
        assert_eq!(config.transport.connect_timeout_ms, 100);

        assert!(ClientConfig::from_file(dir.path().join("missing.toml")).is_err());
    }
}
