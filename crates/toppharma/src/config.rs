//! Configuration management for toppharma.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::flags::Flag;
use crate::source::SourceKind;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "toppharma";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "directory.db";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `TOPPHARMA_`, sections split on `__`)
/// 2. TOML config file at `~/.config/toppharma/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server configuration.
    pub server: ServerConfig,
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Data source configuration.
    pub sources: SourcesConfig,
    /// Default feature flag values, keyed by flag name.
    pub flags: BTreeMap<String, bool>,
    /// Admin configuration.
    pub admin: AdminConfig,
}

/// Deployment environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development; destructive admin operations are allowed.
    #[default]
    Development,
    /// Production; flag resets are refused.
    Production,
}

impl Environment {
    /// Whether this is the production environment.
    #[must_use]
    pub fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the server binds to.
    pub bind_address: String,
    /// Deployment environment.
    pub environment: Environment,
    /// Allowed CORS origins. `*` allows any origin; empty disables CORS headers.
    pub cors_origins: Vec<String>,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/toppharma/directory.db`
    pub database_path: Option<PathBuf>,
}

/// Data source configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// The data source active at startup (`mock` or `database`).
    pub default: String,
}

/// Admin configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Service key for the privileged connection check.
    /// When unset, the admin check is reported as not tested.
    pub service_key: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:4321".to_string(),
            environment: Environment::Development,
            cors_origins: Vec::new(),
        }
    }
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            default: SourceKind::Mock.as_str().to_string(),
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, parsing or validation fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("TOPPHARMA_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        self.bind_address()?;

        if self.sources.default.parse::<SourceKind>().is_err() {
            return Err(Error::config_validation(format!(
                "unknown default data source: {}",
                self.sources.default
            )));
        }

        for name in self.flags.keys() {
            if Flag::from_name(name).is_none() {
                return Err(Error::config_validation(format!(
                    "unknown feature flag: {name}"
                )));
            }
        }

        Ok(())
    }

    /// Parse the configured bind address.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is not a valid socket address.
    pub fn bind_address(&self) -> Result<SocketAddr> {
        self.server.bind_address.parse().map_err(|_| {
            Error::config_validation(format!(
                "invalid bind address: {}",
                self.server.bind_address
            ))
        })
    }

    /// The data source active at startup.
    ///
    /// Falls back to the mock source when the name does not parse; `validate`
    /// rejects such configurations before they get this far.
    #[must_use]
    pub fn default_source(&self) -> SourceKind {
        self.sources.default.parse().unwrap_or(SourceKind::Mock)
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.server.bind_address, "127.0.0.1:4321");
        assert_eq!(config.server.environment, Environment::Development);
        assert!(config.server.cors_origins.is_empty());
        assert_eq!(config.sources.default, "mock");
        assert!(config.flags.is_empty());
        assert!(config.admin.service_key.is_none());
    }

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_invalid_bind_address() {
        let mut config = Config::default();
        config.server.bind_address = "not-an-address".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("invalid bind address"));
    }

    #[test]
    fn test_validate_unknown_source() {
        let mut config = Config::default();
        config.sources.default = "supabase".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("unknown default data source"));
    }

    #[test]
    fn test_validate_unknown_flag() {
        let mut config = Config::default();
        config.flags.insert("useTimeTravel".to_string(), true);

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("useTimeTravel"));
    }

    #[test]
    fn test_validate_known_flag() {
        let mut config = Config::default();
        config.flags.insert("useDbCompanies".to_string(), true);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_source() {
        let mut config = Config::default();
        assert_eq!(config.default_source(), SourceKind::Mock);

        config.sources.default = "database".to_string();
        assert_eq!(config.default_source(), SourceKind::Database);
    }

    #[test]
    fn test_environment_is_production() {
        assert!(Environment::Production.is_production());
        assert!(!Environment::Development.is_production());
    }

    #[test]
    fn test_environment_serde_lowercase() {
        let json = serde_json::to_string(&Environment::Production).unwrap();
        assert_eq!(json, "\"production\"");
    }

    #[test]
    fn test_database_path_default() {
        let config = Config::default();
        let path = config.database_path();

        assert!(path.to_string_lossy().contains("directory.db"));
    }

    #[test]
    fn test_database_path_custom() {
        let mut config = Config::default();
        config.storage.database_path = Some(PathBuf::from("/custom/path/db.sqlite"));

        assert_eq!(
            config.database_path(),
            PathBuf::from("/custom/path/db.sqlite")
        );
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("toppharma"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        let config = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml"))).unwrap();
        assert_eq!(config.server, ServerConfig::default());
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[server]
bind_address = "0.0.0.0:8080"
environment = "production"

[sources]
default = "database"

[flags]
useDbProducts = true
"#,
        )
        .unwrap();

        let config = Config::load_from(Some(path)).unwrap();
        assert_eq!(config.server.bind_address, "0.0.0.0:8080");
        assert!(config.server.environment.is_production());
        assert_eq!(config.default_source(), SourceKind::Database);
        assert_eq!(config.flags.get("useDbProducts"), Some(&true));
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[sources]\ndefault = \"nowhere\"\n").unwrap();

        assert!(Config::load_from(Some(path)).is_err());
    }

    #[test]
    fn test_config_serialize() {
        let json = serde_json::to_string(&Config::default()).unwrap();
        assert!(json.contains("bind_address"));
        assert!(json.contains("database_path"));
    }
}
