//! Type definitions for MCP tools

use rmcp::ErrorData;
use rmcp::handler::server::wrapper::Json;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::config::{DatabaseConfig, PermissionPolicy};
use crate::driver::Row;
use crate::params::QueryParams;
use crate::security::{ExecutionResult, StatementCategory};

/// Result type for MCP tool handlers returning structured JSON data
pub type ToolResult<T> = Result<Json<T>, ErrorData>;

/// Parameters for the `query` tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct QueryToolParams {
    /// A single SQL statement
    #[schemars(
        description = "Single SQL statement. Example: 'SELECT id, name FROM users WHERE id = %(id)s'"
    )]
    pub sql: String,

    /// Optional bind parameters
    #[serde(default)]
    #[schemars(
        description = "Optional bind parameters: an array for ? or %s placeholders, an object for %(name)s placeholders"
    )]
    pub params: Option<QueryParams>,
}

/// Result of the `query` tool.
///
/// Row-returning statements carry `rows` and `truncated`; other statements carry
/// `last_insert_id` when the server generated one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct QueryResponse {
    /// Statement category
    #[serde(rename = "type")]
    #[schemars(description = "Statement category: select, insert, update, delete or ddl")]
    pub kind: StatementCategory,

    /// Rows returned, or rows affected for data-changing statements
    #[schemars(description = "Rows returned for select, rows affected otherwise")]
    pub rowcount: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Result rows keyed by column name")]
    pub rows: Option<Vec<Row>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(description = "True when rows beyond max_rows were dropped")]
    pub truncated: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Generated AUTO_INCREMENT id, when any")]
    pub last_insert_id: Option<u64>,
}

impl QueryResponse {
    #[must_use]
    pub fn new(kind: StatementCategory, result: ExecutionResult) -> Self {
        match result {
            ExecutionResult::RowSet { rows, truncated } => Self {
                kind,
                rowcount: rows.len() as u64,
                rows: Some(rows),
                truncated: Some(truncated),
                last_insert_id: None,
            },
            ExecutionResult::Mutation {
                affected_rows,
                last_insert_id,
            } => Self {
                kind,
                rowcount: affected_rows,
                rows: None,
                truncated: None,
                last_insert_id,
            },
        }
    }
}

/// Connection endpoint reported by `whoami`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EndpointSummary {
    pub host: String,
    pub port: u16,
    pub user: String,
    #[schemars(description = "Default database, empty when none is selected")]
    pub database: String,
}

/// Connection and permission summary. Holds no credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ConnectionSummary {
    pub database: EndpointSummary,
    pub permissions: PermissionPolicy,
}

impl ConnectionSummary {
    #[must_use]
    pub fn from_config(database: &DatabaseConfig, permissions: &PermissionPolicy) -> Self {
        Self {
            database: EndpointSummary {
                host: database.host.clone(),
                port: database.port,
                user: database.user.clone(),
                database: database.database.clone(),
            },
            permissions: *permissions,
        }
    }
}

/// Result of the `health` tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct HealthStatus {
    #[schemars(description = "True when the database answered a ping")]
    pub ok: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Failure description when ok is false")]
    pub error: Option<String>,
}

impl HealthStatus {
    #[must_use]
    pub const fn healthy() -> Self {
        Self {
            ok: true,
            error: None,
        }
    }

    #[must_use]
    pub fn unhealthy(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(error.into()),
        }
    }
}
