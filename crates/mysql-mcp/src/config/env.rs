//! Environment variable overrides for configuration

use std::env;

use super::builder::ConfigBuilder;
use crate::Result;

/// Environment variable names
pub(crate) mod vars {
    pub const DB_MCP_CONFIG: &str = "DB_MCP_CONFIG";
    pub const DB_HOST: &str = "DB_HOST";
    pub const DB_PORT: &str = "DB_PORT";
    pub const DB_USER: &str = "DB_USER";
    pub const DB_PASSWORD: &str = "DB_PASSWORD";
    pub const DB_NAME: &str = "DB_NAME";
    pub const RUST_LOG: &str = "RUST_LOG";
    pub const MCP_JSON_LOGS: &str = "MCP_JSON_LOGS";
}

/// Apply environment variable overrides on top of the builder
pub fn load_from_env(mut builder: ConfigBuilder) -> Result<ConfigBuilder> {
    if let Ok(host) = env::var(vars::DB_HOST) {
        builder = builder.host(host);
    }

    if let Ok(port_str) = env::var(vars::DB_PORT) {
        let port = port_str.trim().parse::<u16>().map_err(|e| {
            crate::Error::Config(format!("Invalid {}: '{port_str}': {e}", vars::DB_PORT))
        })?;
        builder = builder.port(port);
    }

    if let Ok(user) = env::var(vars::DB_USER) {
        builder = builder.user(user);
    }

    if let Ok(password) = env::var(vars::DB_PASSWORD) {
        builder = builder.password(password);
    }

    if let Ok(name) = env::var(vars::DB_NAME) {
        builder = builder.database_name(name);
    }

    if let Ok(level) = env::var(vars::RUST_LOG) {
        builder = builder.log_level(level);
    }

    if let Ok(val) = env::var(vars::MCP_JSON_LOGS) {
        builder = builder.json_logs(parse_bool(&val));
    }

    Ok(builder)
}

fn parse_bool(s: &str) -> bool {
    matches!(s.to_lowercase().as_str(), "true" | "1" | "yes" | "on")
}
