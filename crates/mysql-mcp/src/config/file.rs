//! TOML configuration file loading

use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use super::builder::ConfigBuilder;
use crate::Result;

/// Load configuration from a TOML file
pub fn load_from_file(path: &Path, builder: ConfigBuilder) -> Result<ConfigBuilder> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::Error::Config(format!(
            "Failed to read config file {}: {}",
            path.display(),
            e
        ))
    })?;

    let file_config: FileConfig = toml::from_str(&content).map_err(|e| {
        crate::Error::Config(format!(
            "Failed to parse config file {}: {}",
            path.display(),
            e
        ))
    })?;

    apply_file_config(builder, file_config)
}

fn apply_file_config(mut builder: ConfigBuilder, config: FileConfig) -> Result<ConfigBuilder> {
    if let Some(db) = config.database {
        if let Some(host) = db.host {
            builder = builder.host(host);
        }

        if let Some(port) = db.port {
            builder = builder.port(port);
        }

        if let Some(user) = db.user {
            builder = builder.user(user);
        }

        if let Some(password) = db.password {
            builder = builder.password(password);
        }

        if let Some(name) = db.database {
            builder = builder.database_name(name);
        }

        if let Some(secs) = db.connect_timeout {
            builder = builder.connect_timeout(Duration::from_secs(secs));
        }

        if let Some(secs) = db.query_timeout_secs {
            builder = builder.query_timeout(Duration::from_secs(secs));
        }

        if let Some(size) = db.pool_size
            && let Some(nz) = NonZeroU32::new(size)
        {
            builder = builder.pool_size(nz);
        }
    }

    if let Some(perms) = config.permissions {
        if let Some(allow) = perms.select {
            builder = builder.allow_select(allow);
        }

        if let Some(allow) = perms.insert {
            builder = builder.allow_insert(allow);
        }

        if let Some(allow) = perms.update {
            builder = builder.allow_update(allow);
        }

        if let Some(allow) = perms.delete {
            builder = builder.allow_delete(allow);
        }

        if let Some(allow) = perms.ddl {
            builder = builder.allow_ddl(allow);
        }

        if let Some(max_rows) = perms.max_rows {
            builder = builder.max_rows(clamp_max_rows(max_rows));
        }
    }

    if let Some(obs) = config.observability {
        if let Some(level) = obs.log_level {
            builder = builder.log_level(level);
        }

        if let Some(json) = obs.json_logs {
            builder = builder.json_logs(json);
        }

        if let Some(addr_str) = obs.metrics_addr {
            let addr = addr_str.parse::<SocketAddr>().map_err(|e| {
                crate::Error::Config(format!("Invalid metrics_addr '{addr_str}': {e}"))
            })?;
            builder = builder.metrics_addr(Some(addr));
        }
    }

    Ok(builder)
}

/// Negative limits mean "unlimited", oversized ones saturate
fn clamp_max_rows(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

/// Root configuration file structure
#[derive(Debug, Deserialize, Default)]
struct FileConfig {
    #[serde(alias = "mysql")]
    database: Option<DatabaseSection>,
    permissions: Option<PermissionsSection>,
    observability: Option<ObservabilitySection>,
}

#[derive(Debug, Deserialize)]
struct DatabaseSection {
    host: Option<String>,
    port: Option<u16>,
    user: Option<String>,
    password: Option<String>,
    database: Option<String>,
    connect_timeout: Option<u64>,
    query_timeout_secs: Option<u64>,
    pool_size: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct PermissionsSection {
    select: Option<bool>,
    insert: Option<bool>,
    update: Option<bool>,
    delete: Option<bool>,
    ddl: Option<bool>,
    max_rows: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ObservabilitySection {
    log_level: Option<String>,
    json_logs: Option<bool>,
    metrics_addr: Option<String>,
}
