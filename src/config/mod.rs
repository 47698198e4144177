//! Configuration module for Tally.
//!
//! Provides YAML-based configuration loading and validation for:
//! - Server settings (bind address, port, shutdown timeout)
//! - Database settings (driver, DSN, pool size, acquire timeout)

mod app;
mod validation;

pub use app::{
    AppConfig, DEFAULT_DSN, DEFAULT_SHUTDOWN_TIMEOUT, DatabaseConfig, DatabaseDriver, ServerConfig,
};
pub use validation::{ConfigError, expand_env_vars};
