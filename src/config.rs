// src/config.rs
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const MEMORY_DATABASE: &str = ":memory:";

/// TOML configuration for the bookmark server
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_path")]
    pub path: PathBuf,
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

// Default value functions
fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 9000 }
fn default_busy_timeout_ms() -> u64 { 5000 }
fn default_wal_mode() -> bool { true }

fn default_database_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("findfirst")
        .join("findfirst.db")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
            wal_mode: default_wal_mode(),
        }
    }
}

impl DatabaseConfig {
    pub fn memory() -> Self {
        Self {
            path: PathBuf::from(MEMORY_DATABASE),
            ..Self::default()
        }
    }

    pub fn at(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    pub fn is_memory(&self) -> bool {
        self.path.to_str() == Some(MEMORY_DATABASE)
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file {}", path.as_ref().display()))?;

        let config: Config = toml::from_str(&content)
            .context("Failed to parse TOML config")?;

        Ok(config)
    }

    /// Load an explicit config file, or the default location if it exists,
    /// falling back to built-in defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            debug!(?path, "Loading configuration");
            return Self::load(path);
        }
        match Self::default_location() {
            Some(path) if path.exists() => {
                debug!(?path, "Loading configuration from default location");
                Self::load(path)
            }
            _ => {
                debug!("No configuration file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// `<config_dir>/findfirst/findfirst.toml`
    pub fn default_location() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("findfirst").join("findfirst.toml"))
    }

    /// Save configuration to TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let toml_string = toml::to_string_pretty(self)
            .context("Failed to serialize config to TOML")?;

        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create config directory")?;
        }
        std::fs::write(path.as_ref(), toml_string)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Create default configuration file at path
    pub fn create_default(path: impl AsRef<Path>) -> Result<Self> {
        let config = Self::default();
        config.save(path)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn given_no_file_when_creating_default_then_creates_with_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("findfirst.toml");

        let config = Config::create_default(&config_path).unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.database.busy_timeout_ms, 5000);
        assert!(config.database.wal_mode);
        assert!(config_path.exists());
    }

    #[test]
    fn given_config_when_saving_then_writes_toml_sections() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("test.toml");

        Config::default().save(&config_path).unwrap();

        let content = fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("[server]"));
        assert!(content.contains("[database]"));
    }

    #[test]
    fn given_partial_toml_when_loading_then_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("partial.toml");
        fs::write(
            &config_path,
            r#"
[server]
port = 8088

[database]
path = ":memory:"
"#,
        )
        .unwrap();

        let config = Config::load(&config_path).unwrap();

        assert_eq!(config.server.port, 8088);
        assert_eq!(config.server.host, "127.0.0.1");
        assert!(config.database.is_memory());
        assert_eq!(config.database.busy_timeout_ms, 5000);
    }

    #[test]
    fn given_explicit_missing_file_when_resolving_then_returns_error() {
        let result = Config::resolve(Some(Path::new("/nonexistent/findfirst.toml")));

        assert!(result.is_err());
    }

    #[test]
    fn given_round_trip_when_saving_and_loading_then_preserves_values() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("roundtrip.toml");
        let original = Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8443,
            },
            database: DatabaseConfig {
                path: PathBuf::from("/var/lib/findfirst/bookmarks.db"),
                busy_timeout_ms: 250,
                wal_mode: false,
            },
        };

        original.save(&config_path).unwrap();
        let loaded = Config::load(&config_path).unwrap();

        assert_eq!(loaded, original);
    }
}
