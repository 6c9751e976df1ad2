//! MCP server for MySQL and MariaDB with a statement permission policy

pub mod config;
pub mod driver;
mod error;
pub mod executor;
mod helpers;
pub mod observability;
pub mod params;
mod pool;
pub mod security;
pub mod server;
pub mod transport;
pub mod types;

pub use config::{
    Config, ConfigBuilder, DatabaseConfig, Permission, PermissionPolicy, TelemetryConfig,
};
pub use driver::{Database, DriverOutcome, MySqlDatabase, Row};
pub use error::{Error, Result};
pub use executor::Executor;
pub use params::QueryParams;
pub use pool::{Pool, create_pool};
pub use security::{ExecutionResult, StatementCategory, StatementGuard};
pub use server::ServerHandler;
pub use types::*;
