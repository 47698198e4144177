//! Application configuration structures.

use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::storage::StorageBuilder;
use crate::storage::db::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_MAX_CONNECTIONS};

use super::validation::{ConfigError, expand_env_vars};

// =============================================================================
// Constants
// =============================================================================

/// Default graceful shutdown timeout (3 seconds).
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(3);

/// Default database file path.
pub const DEFAULT_DSN: &str = "data/tally.db";

fn default_max_connections() -> u32 {
    DEFAULT_MAX_CONNECTIONS
}

fn default_acquire_timeout() -> Duration {
    DEFAULT_CONNECT_TIMEOUT
}

fn default_dsn() -> String {
    DEFAULT_DSN.to_string()
}

// =============================================================================
// Server Configuration
// =============================================================================

/// Web server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server bind address (default: "0.0.0.0").
    pub bind: String,

    /// Server port (default: 8080).
    pub port: u16,

    /// How long in-flight requests may run after a shutdown signal (default: "3s").
    #[serde(with = "humantime_serde")]
    pub shutdown_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 8080,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }
}

// =============================================================================
// Database Configuration
// =============================================================================

/// Storage backend selector.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DatabaseDriver {
    /// Durable SQLite file.
    #[default]
    Sqlite,
    /// Process memory, lost on exit.
    Memory,
}

/// Database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Backend (default: sqlite).
    #[serde(default)]
    pub driver: DatabaseDriver,

    /// File path or `sqlite:` URL. Supports `${VAR:-default}` expansion.
    #[serde(default = "default_dsn")]
    pub dsn: String,

    /// Connection pool size (default: 5).
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Pool acquire timeout (default: "30s").
    #[serde(default = "default_acquire_timeout", with = "humantime_serde")]
    pub acquire_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            driver: DatabaseDriver::default(),
            dsn: default_dsn(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl DatabaseConfig {
    /// sqlx connection URL for the configured DSN.
    ///
    /// A value already starting with `sqlite:` is used as is; a bare path
    /// becomes `sqlite:<path>?mode=rwc`.
    pub fn connection_url(&self) -> String {
        if self.dsn.starts_with("sqlite:") {
            self.dsn.clone()
        } else {
            format!("sqlite:{}?mode=rwc", self.dsn)
        }
    }

    /// Storage builder for this configuration.
    pub fn storage_builder(&self) -> StorageBuilder {
        let builder = match self.driver {
            DatabaseDriver::Sqlite => StorageBuilder::sqlite(self.connection_url()),
            DatabaseDriver::Memory => StorageBuilder::memory(),
        };
        builder
            .max_connections(self.max_connections)
            .acquire_timeout(self.acquire_timeout)
    }
}

// =============================================================================
// Application Configuration
// =============================================================================

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Web server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
}

impl AppConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read, parsed, or validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse, expand environment references and validate YAML content.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yaml::from_str(content)?;
        config.database.dsn = expand_env_vars(&config.database.dsn);
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    /// Returns `ConfigError::ValidationError` if any field is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.bind.parse::<IpAddr>().map_err(|_| {
            ConfigError::ValidationError(format!(
                "invalid server bind address: '{}'",
                self.server.bind
            ))
        })?;

        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "server port must be non-zero".to_string(),
            ));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::ValidationError(
                "database max_connections must be positive".to_string(),
            ));
        }

        if self.database.driver == DatabaseDriver::Sqlite && self.database.dsn.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "database dsn is required for the sqlite driver".to_string(),
            ));
        }

        Ok(())
    }
}
