use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};

use crate::config::DatabaseConfig;

pub type Pool = MySqlPool;

/// Connection options for the configured server. Empty password and database are left unset.
pub fn connect_options(config: &DatabaseConfig) -> MySqlConnectOptions {
    let mut options = MySqlConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.user)
        .charset("utf8mb4");

    if !config.password.is_empty() {
        options = options.password(&config.password);
    }
    if !config.database.is_empty() {
        options = options.database(&config.database);
    }

    options
}

/// Build a lazily connecting pool; no connection is opened until first use
pub fn create_pool(config: &DatabaseConfig) -> Pool {
    MySqlPoolOptions::new()
        .max_connections(config.pool_size.get())
        .acquire_timeout(config.connect_timeout)
        .connect_lazy_with(connect_options(config))
}
