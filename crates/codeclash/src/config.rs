//! Configuration management for the CodeClash client.
//!
//! This module handles loading and validation of client configuration from
//! TOML files. Command-line flags are applied on top by the application.

use clash_client::ConnectionConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

fn default_connect_timeout() -> u64 {
    10
}

fn default_mode() -> String {
    "STANDARD".to_string()
}

/// Application configuration loaded from TOML file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Battle server connection settings
    #[serde(default)]
    pub server: ServerSettings,
    /// Local client behaviour
    #[serde(default)]
    pub client: ClientSettings,
    /// Logging configuration settings
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Where the battle server lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSettings {
    /// WebSocket URL of the battle service
    pub socket_url: String,
    /// Handshake timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            socket_url: "ws://localhost:5000/battle".to_string(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientSettings {
    /// Directory holding the persisted partitions
    pub storage_dir: PathBuf,
    /// Matchmaking mode used when none is given on the command line
    #[serde(default = "default_mode")]
    pub default_mode: String,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from(".codeclash"),
            default_mode: default_mode(),
        }
    }
}

/// Logging system configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level filter (trace, debug, info, warn, error)
    pub level: String,
    /// Whether to output logs in JSON format
    #[serde(default)]
    pub json_format: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

impl AppConfig {
    /// Loads configuration from `path`, writing the defaults there first if
    /// the file does not exist yet.
    pub async fn load_from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        if path.exists() {
            let content = tokio::fs::read_to_string(path).await?;
            let config: AppConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            let default_config = AppConfig::default();
            let toml_content = toml::to_string_pretty(&default_config)?;
            tokio::fs::write(path, toml_content).await?;
            info!("Created default configuration file: {}", path.display());
            Ok(default_config)
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let url = self.server.socket_url.as_str();
        if !(url.starts_with("ws://") || url.starts_with("wss://")) {
            return Err(format!("Invalid socket URL: {url}. Must start with ws:// or wss://"));
        }

        if self.server.connect_timeout_secs == 0 {
            return Err("server.connect_timeout_secs must be greater than 0".to_string());
        }

        if self.client.default_mode.trim().is_empty() {
            return Err("client.default_mode cannot be empty".to_string());
        }

        if self.client.storage_dir.as_os_str().is_empty() {
            return Err("client.storage_dir cannot be empty".to_string());
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(format!(
                "Invalid log level: {}. Must be one of: {valid_levels:?}",
                &self.logging.level
            ));
        }

        Ok(())
    }

    pub fn to_connection_config(&self) -> ConnectionConfig {
        ConnectionConfig::new(self.server.socket_url.clone())
            .with_timeout(Duration::from_secs(self.server.connect_timeout_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();

        assert_eq!(config.server.socket_url, "ws://localhost:5000/battle");
        assert_eq!(config.server.connect_timeout_secs, 10);
        assert_eq!(config.client.default_mode, "STANDARD");
        assert_eq!(config.client.storage_dir, PathBuf::from(".codeclash"));
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json_format);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = AppConfig::default();

        config.server.socket_url = "http://localhost:5000".to_string();
        assert!(config.validate().is_err());

        config.server.socket_url = "wss://clash.example.com/battle".to_string();
        config.server.connect_timeout_secs = 0;
        assert!(config.validate().is_err());

        config.server.connect_timeout_secs = 5;
        config.client.default_mode = "  ".to_string();
        assert!(config.validate().is_err());

        config.client.default_mode = "RANKED".to_string();
        config.logging.level = "verbose".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.contains("Invalid log level"));

        config.logging.level = "debug".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [server]
            socket_url = "wss://clash.example.com/battle"

            [logging]
            level = "warn"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.socket_url, "wss://clash.example.com/battle");
        assert_eq!(config.server.connect_timeout_secs, 10);
        assert_eq!(config.client, ClientSettings::default());
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_connection_config_conversion() {
        let mut config = AppConfig::default();
        config.server.connect_timeout_secs = 3;

        let connection = config.to_connection_config();

        assert_eq!(connection.url, "ws://localhost:5000/battle");
        assert_eq!(connection.connect_timeout, Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_load_from_existing_file() {
        let file = NamedTempFile::new().unwrap();
        let mut config = AppConfig::default();
        config.client.default_mode = "BLITZ".to_string();
        tokio::fs::write(file.path(), toml::to_string_pretty(&config).unwrap())
            .await
            .unwrap();

        let loaded = AppConfig::load_from_file(file.path()).await.unwrap();

        assert_eq!(loaded, config);
    }

    #[tokio::test]
    async fn test_missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("codeclash.toml");

        let loaded = AppConfig::load_from_file(&path).await.unwrap();

        assert_eq!(loaded, AppConfig::default());
        assert!(path.exists());
        let reloaded = AppConfig::load_from_file(&path).await.unwrap();
        assert_eq!(reloaded, loaded);
    }

    #[tokio::test]
    async fn test_invalid_toml_is_an_error() {
        let file = NamedTempFile::new().unwrap();
        tokio::fs::write(file.path(), "server = [").await.unwrap();

        assert!(AppConfig::load_from_file(file.path()).await.is_err());
    }
}
