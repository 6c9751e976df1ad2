//! Database client abstraction and its MySQL implementation

use async_trait::async_trait;
use serde_json::Value;
use sqlx::Connection;
use sqlx::mysql::MySqlPool;

use crate::helpers::{bind_params, row_to_json};

/// A result row: column name to JSON value, in column order
pub type Row = serde_json::Map<String, Value>;

/// Raw outcome of a statement, before shaping
#[derive(Debug, Clone, PartialEq)]
pub enum DriverOutcome {
    Rows(Vec<Row>),
    Mutation {
        affected_rows: u64,
        last_insert_id: Option<u64>,
    },
}

/// Async database client used by the executor.
///
/// `params` are positional values for `?` placeholders; an empty slice means the
/// statement is sent as-is.
#[async_trait]
pub trait Database: Send + Sync {
    /// Run a row-returning statement and collect every row
    async fn fetch_rows(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, sqlx::Error>;

    /// Run a statement that modifies data or schema
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<DriverOutcome, sqlx::Error>;

    /// Liveness check
    async fn ping(&self) -> Result<(), sqlx::Error>;
}

/// [`Database`] backed by a `sqlx` MySQL pool
#[derive(Debug, Clone)]
pub struct MySqlDatabase {
    pool: MySqlPool,
}

impl MySqlDatabase {
    #[must_use]
    pub const fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub const fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}

#[async_trait]
impl Database for MySqlDatabase {
    async fn fetch_rows(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, sqlx::Error> {
        // Text protocol without params: SHOW and DESCRIBE are not always preparable
        let rows = if params.is_empty() {
            sqlx::raw_sql(sql).fetch_all(&self.pool).await?
        } else {
            bind_params(sqlx::query(sql), params)
                .fetch_all(&self.pool)
                .await?
        };

        rows.iter().map(row_to_json).collect()
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> Result<DriverOutcome, sqlx::Error> {
        let result = if params.is_empty() {
            sqlx::raw_sql(sql).execute(&self.pool).await?
        } else {
            bind_params(sqlx::query(sql), params)
                .execute(&self.pool)
                .await?
        };

        Ok(DriverOutcome::Mutation {
            affected_rows: result.rows_affected(),
            last_insert_id: Some(result.last_insert_id()),
        })
    }

    async fn ping(&self) -> Result<(), sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        conn.ping().await
    }
}
