//! Configuration management
//!
//! The config file is located with precedence: CLI path > `DB_MCP_CONFIG` > `./config.toml`.
//! Values are then layered: defaults < file < environment.

mod builder;
mod database;
mod env;
mod file;
mod permissions;

use std::path::{Path, PathBuf};

pub use builder::{Config, ConfigBuilder, TelemetryConfig};
pub use database::DatabaseConfig;
pub use permissions::{DEFAULT_MAX_ROWS, Permission, PermissionPolicy};

use crate::Result;

/// Config file used when neither CLI nor environment names one
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Where the config file path came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    CommandLine,
    Environment,
    Default,
}

/// Resolve the config file path: explicit CLI path, then `DB_MCP_CONFIG`, then the default
pub fn resolve_config_path(cli_path: Option<&Path>) -> (PathBuf, ConfigSource) {
    if let Some(path) = cli_path {
        return (path.to_path_buf(), ConfigSource::CommandLine);
    }

    match std::env::var(env::vars::DB_MCP_CONFIG) {
        Ok(path) if !path.trim().is_empty() => (PathBuf::from(path), ConfigSource::Environment),
        _ => (PathBuf::from(DEFAULT_CONFIG_PATH), ConfigSource::Default),
    }
}

/// Load configuration for the given CLI path argument
pub fn load_config(cli_path: Option<&Path>) -> Result<ConfigBuilder> {
    let (path, source) = resolve_config_path(cli_path);
    let mut builder = ConfigBuilder::new();

    if source == ConfigSource::Default && !path.exists() {
        tracing::warn!(
            path = %path.display(),
            "Config file not found, using built-in defaults"
        );
    } else {
        tracing::info!(path = %path.display(), ?source, "Loading configuration");
        builder = file::load_from_file(&path, builder)?;
    }

    env::load_from_env(builder)
}
