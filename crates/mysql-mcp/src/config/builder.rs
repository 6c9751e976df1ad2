//! Configuration builder

use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::time::Duration;

use super::database::DatabaseConfig;
use super::permissions::PermissionPolicy;
use crate::Error;

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub permissions: PermissionPolicy,
    pub query_timeout: Duration,
    pub telemetry: TelemetryConfig,
}

impl Config {
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    #[must_use]
    pub const fn database(&self) -> &DatabaseConfig {
        &self.database
    }

    #[must_use]
    pub const fn permissions(&self) -> &PermissionPolicy {
        &self.permissions
    }

    #[must_use]
    pub const fn query_timeout(&self) -> Duration {
        self.query_timeout
    }
}

/// Logging and metrics configuration
#[derive(Debug, Clone, Default)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub json_logs: bool,
    pub metrics_addr: Option<SocketAddr>,
}

/// Configuration builder with fluent API
#[derive(Debug)]
pub struct ConfigBuilder {
    database: DatabaseConfig,
    permissions: PermissionPolicy,
    query_timeout: Duration,
    telemetry: TelemetryConfig,
}

impl ConfigBuilder {
    const DEFAULT_LOG_LEVEL: &'static str = "info";

    #[must_use]
    pub fn new() -> Self {
        Self {
            database: DatabaseConfig::new(),
            permissions: PermissionPolicy::new(),
            query_timeout: Duration::from_secs(30),
            telemetry: TelemetryConfig {
                log_level: Self::DEFAULT_LOG_LEVEL.to_string(),
                json_logs: false,
                metrics_addr: None,
            },
        }
    }

    // Database settings

    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.database.host = host.into();
        self
    }

    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.database.port = port;
        self
    }

    #[must_use]
    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.database.user = user.into();
        self
    }

    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.database.password = password.into();
        self
    }

    #[must_use]
    pub fn database_name(mut self, database: impl Into<String>) -> Self {
        self.database.database = database.into();
        self
    }

    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.database.connect_timeout = timeout;
        self
    }

    #[must_use]
    pub const fn pool_size(mut self, size: NonZeroU32) -> Self {
        self.database.pool_size = size;
        self
    }

    #[must_use]
    pub const fn query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    // Permission settings

    /// Replace the whole permission policy
    #[must_use]
    pub const fn permissions(mut self, policy: PermissionPolicy) -> Self {
        self.permissions = policy;
        self
    }

    #[must_use]
    pub const fn allow_select(mut self, allow: bool) -> Self {
        self.permissions.select = allow;
        self
    }

    #[must_use]
    pub const fn allow_insert(mut self, allow: bool) -> Self {
        self.permissions.insert = allow;
        self
    }

    #[must_use]
    pub const fn allow_update(mut self, allow: bool) -> Self {
        self.permissions.update = allow;
        self
    }

    #[must_use]
    pub const fn allow_delete(mut self, allow: bool) -> Self {
        self.permissions.delete = allow;
        self
    }

    #[must_use]
    pub const fn allow_ddl(mut self, allow: bool) -> Self {
        self.permissions.ddl = allow;
        self
    }

    /// Set maximum returned rows (0 = unlimited)
    #[must_use]
    pub const fn max_rows(mut self, max_rows: u32) -> Self {
        self.permissions.max_rows = max_rows;
        self
    }

    // Telemetry settings

    #[must_use]
    pub fn log_level(mut self, level: String) -> Self {
        self.telemetry.log_level = level;
        self
    }

    #[must_use]
    pub const fn json_logs(mut self, enabled: bool) -> Self {
        self.telemetry.json_logs = enabled;
        self
    }

    #[must_use]
    pub const fn metrics_addr(mut self, addr: Option<SocketAddr>) -> Self {
        self.telemetry.metrics_addr = addr;
        self
    }

    pub fn build(self) -> Result<Config, Error> {
        if self.database.host.trim().is_empty() {
            return Err(Error::Config("database host must not be empty".into()));
        }

        if self.database.port == 0 {
            return Err(Error::Config("database port must not be 0".into()));
        }

        if self.query_timeout.is_zero() {
            return Err(Error::Config("query timeout must be greater than 0".into()));
        }

        if self.database.connect_timeout.is_zero() {
            return Err(Error::Config(
                "connect timeout must be greater than 0".into(),
            ));
        }

        let mut telemetry = self.telemetry;
        if telemetry.log_level.trim().is_empty() {
            telemetry.log_level = Self::DEFAULT_LOG_LEVEL.to_string();
        }

        Ok(Config {
            database: self.database,
            permissions: self.permissions,
            query_timeout: self.query_timeout,
            telemetry,
        })
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Permission;

    #[test]
    fn test_builder_defaults() {
        let config = ConfigBuilder::new().build().unwrap();
        assert_eq!(config.database.host, "127.0.0.1");
        assert_eq!(config.database.port, 3306);
        assert_eq!(config.query_timeout, Duration::from_secs(30));
        assert_eq!(config.telemetry.log_level, "info");
        assert!(!config.telemetry.json_logs);
        assert!(config.telemetry.metrics_addr.is_none());
        assert_eq!(*config.permissions(), PermissionPolicy::new());
    }

    #[test]
    fn test_builder_database_settings() {
        let config = Config::builder()
            .host("db.internal")
            .port(3307)
            .user("app")
            .password("secret")
            .database_name("shop")
            .connect_timeout(Duration::from_secs(2))
            .pool_size(NonZeroU32::new(8).unwrap())
            .build()
            .unwrap();

        let db = config.database();
        assert_eq!(db.host, "db.internal");
        assert_eq!(db.port, 3307);
        assert_eq!(db.user, "app");
        assert_eq!(db.password, "secret");
        assert_eq!(db.database, "shop");
        assert_eq!(db.connect_timeout, Duration::from_secs(2));
        assert_eq!(db.pool_size.get(), 8);
    }

    #[test]
    fn test_builder_permission_flags() {
        let config = ConfigBuilder::new()
            .allow_select(false)
            .allow_insert(true)
            .allow_update(true)
            .allow_delete(true)
            .allow_ddl(true)
            .max_rows(0)
            .build()
            .unwrap();

        let policy = config.permissions();
        assert!(!policy.allows(Permission::Select));
        assert!(policy.allows(Permission::Insert));
        assert!(policy.allows(Permission::Update));
        assert!(policy.allows(Permission::Delete));
        assert!(policy.allows(Permission::Ddl));
        assert!(policy.row_limit().is_none());
    }

    #[test]
    fn test_builder_replace_policy() {
        let config = ConfigBuilder::new()
            .permissions(PermissionPolicy::deny_all())
            .build()
            .unwrap();
        assert_eq!(config.permissions, PermissionPolicy::deny_all());
    }

    #[test]
    fn test_builder_rejects_empty_host() {
        let result = ConfigBuilder::new().host("  ").build();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("host"));
    }

    #[test]
    fn test_builder_rejects_zero_port() {
        let result = ConfigBuilder::new().port(0).build();
        assert!(result.unwrap_err().is_config());
    }

    #[test]
    fn test_builder_rejects_zero_timeouts() {
        assert!(
            ConfigBuilder::new()
                .query_timeout(Duration::ZERO)
                .build()
                .is_err()
        );
        assert!(
            ConfigBuilder::new()
                .connect_timeout(Duration::ZERO)
                .build()
                .is_err()
        );
    }

    #[test]
    fn test_builder_empty_log_level_falls_back() {
        let config = ConfigBuilder::new()
            .log_level(String::new())
            .build()
            .unwrap();
        assert_eq!(config.telemetry.log_level, "info");
    }

    #[test]
    fn test_builder_telemetry() {
        let addr: SocketAddr = "127.0.0.1:9464".parse().unwrap();
        let config = ConfigBuilder::new()
            .log_level("debug".to_string())
            .json_logs(true)
            .metrics_addr(Some(addr))
            .build()
            .unwrap();
        assert_eq!(config.telemetry.log_level, "debug");
        assert!(config.telemetry.json_logs);
        assert_eq!(config.telemetry.metrics_addr, Some(addr));
    }
}
