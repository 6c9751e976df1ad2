//! Statement execution pipeline: guard, bind, run, shape

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::driver::{Database, DriverOutcome};
use crate::params::QueryParams;
use crate::security::{StatementCategory, StatementGuard};
use crate::types::{ConnectionSummary, HealthStatus, QueryResponse};
use crate::{Error, Result};

/// Runs statements against a [`Database`] under the configured policy
pub struct Executor {
    guard: StatementGuard,
    db: Arc<dyn Database>,
    summary: ConnectionSummary,
    query_timeout: Duration,
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("guard", &self.guard)
            .field("summary", &self.summary)
            .field("query_timeout", &self.query_timeout)
            .finish_non_exhaustive()
    }
}

impl Executor {
    #[must_use]
    pub fn new(config: &Config, db: Arc<dyn Database>) -> Self {
        Self {
            guard: StatementGuard::new(*config.permissions()),
            db,
            summary: ConnectionSummary::from_config(config.database(), config.permissions()),
            query_timeout: config.query_timeout(),
        }
    }

    #[must_use]
    pub const fn guard(&self) -> &StatementGuard {
        &self.guard
    }

    /// Execute a single statement.
    ///
    /// Rejected statements never reach the database.
    pub async fn query(&self, sql: &str, params: Option<&QueryParams>) -> Result<QueryResponse> {
        let statement = self.guard.inspect(sql).inspect_err(|e| {
            tracing::warn!(kind = e.kind(), error = %e, "Statement rejected");
            #[cfg(feature = "metrics")]
            crate::observability::record_denial(e.kind());
        })?;

        let category = statement.category;
        let (sql, values) = match params {
            Some(params) => params.bind(statement.sql).inspect_err(|e| {
                tracing::warn!(category = %category, error = %e, "Parameter binding failed");
            })?,
            None => (statement.sql.to_owned(), Vec::new()),
        };

        tracing::debug!(category = %category, params = values.len(), "Executing statement");

        let started = Instant::now();
        let outcome = self.run(category, &sql, &values).await;
        let elapsed = started.elapsed();

        #[cfg(feature = "metrics")]
        crate::observability::record_statement(
            category.as_str(),
            outcome.as_ref().map_or_else(|e| e.kind(), |_| "success"),
            elapsed,
        );

        let outcome = outcome.inspect_err(|e| {
            tracing::error!(
                category = %category,
                kind = e.kind(),
                elapsed_ms = elapsed.as_millis() as u64,
                error = %e,
                "Statement failed"
            );
        })?;

        let response = QueryResponse::new(category, self.guard.shape(outcome));

        #[cfg(feature = "metrics")]
        if response.rows.is_some() {
            crate::observability::record_rows(
                response.rowcount,
                response.truncated.unwrap_or(false),
            );
        }

        tracing::info!(
            category = %category,
            rowcount = response.rowcount,
            truncated = response.truncated.unwrap_or(false),
            elapsed_ms = elapsed.as_millis() as u64,
            "Statement executed"
        );

        Ok(response)
    }

    async fn run(
        &self,
        category: StatementCategory,
        sql: &str,
        values: &[serde_json::Value],
    ) -> Result<DriverOutcome> {
        let call = async {
            if category.returns_rows() {
                self.db.fetch_rows(sql, values).await.map(DriverOutcome::Rows)
            } else {
                self.db.execute(sql, values).await
            }
        };

        tokio::time::timeout(self.query_timeout, call)
            .await
            .map_err(|_| Error::QueryTimeout(self.query_timeout))?
            .map_err(|e| Error::driver(category.as_str(), e))
    }

    /// Connection and permission summary
    #[must_use]
    pub fn whoami(&self) -> ConnectionSummary {
        self.summary.clone()
    }

    /// Ping the database. Failures are reported in the result, never as errors.
    pub async fn health(&self) -> HealthStatus {
        let result = tokio::time::timeout(self.query_timeout, self.db.ping())
            .await
            .map_err(|_| Error::QueryTimeout(self.query_timeout))
            .and_then(|ping| ping.map_err(|e| Error::driver("ping", e)));

        #[cfg(feature = "metrics")]
        crate::observability::record_health_check(result.is_ok());

        match result {
            Ok(()) => HealthStatus::healthy(),
            Err(e) => {
                tracing::warn!(error = %e, "Health check failed");
                HealthStatus::unhealthy(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU32;

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::{Value, json};

    use super::*;
    use crate::config::{ConfigBuilder, PermissionPolicy};
    use crate::driver::{MySqlDatabase, Row};
    use crate::pool::create_pool;

    type DriverResult<T> = std::result::Result<T, sqlx::Error>;

    /// Records every call and answers from canned data
    #[derive(Default)]
    struct SpyDatabase {
        calls: Mutex<Vec<(String, Vec<Value>)>>,
        pings: Mutex<usize>,
        rows: Vec<Row>,
        mutation: Option<DriverOutcome>,
        delay: Option<Duration>,
        ping_error: bool,
    }

    impl SpyDatabase {
        fn with_rows(count: i64) -> Self {
            let rows = (0..count)
                .map(|id| {
                    let mut row = Row::new();
                    row.insert("id".to_string(), json!(id));
                    row
                })
                .collect();
            Self {
                rows,
                ..Self::default()
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().len()
        }

        async fn record(&self, sql: &str, params: &[Value]) {
            self.calls.lock().push((sql.to_string(), params.to_vec()));
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
        }
    }

    #[async_trait]
    impl Database for SpyDatabase {
        async fn fetch_rows(&self, sql: &str, params: &[Value]) -> DriverResult<Vec<Row>> {
            self.record(sql, params).await;
            Ok(self.rows.clone())
        }

        async fn execute(&self, sql: &str, params: &[Value]) -> DriverResult<DriverOutcome> {
            self.record(sql, params).await;
            Ok(self.mutation.clone().unwrap_or(DriverOutcome::Mutation {
                affected_rows: 1,
                last_insert_id: Some(0),
            }))
        }

        async fn ping(&self) -> DriverResult<()> {
            *self.pings.lock() += 1;
            if self.ping_error {
                Err(sqlx::Error::PoolTimedOut)
            } else {
                Ok(())
            }
        }
    }

    fn executor_for(policy: PermissionPolicy, db: Arc<SpyDatabase>) -> Executor {
        let config = ConfigBuilder::new()
            .password("s3cr3t-pass")
            .permissions(policy)
            .build()
            .unwrap();
        Executor::new(&config, db)
    }

    #[tokio::test]
    async fn test_select_returns_rows() {
        let db = Arc::new(SpyDatabase::with_rows(3));
        let executor = executor_for(PermissionPolicy::new(), db.clone());

        let response = executor.query("SELECT id FROM t;", None).await.unwrap();
        assert_eq!(response.kind, StatementCategory::SelectLike);
        assert_eq!(response.rowcount, 3);
        assert_eq!(response.truncated, Some(false));
        assert_eq!(db.calls.lock()[0].0, "SELECT id FROM t");
    }

    #[tokio::test]
    async fn test_disabled_flag_never_reaches_driver() {
        let db = Arc::new(SpyDatabase::default());
        let executor = executor_for(PermissionPolicy::new(), db.clone());

        for sql in [
            "INSERT INTO t VALUES (1)",
            "REPLACE INTO t VALUES (1)",
            "UPDATE t SET a = 1",
            "DELETE FROM t",
            "DROP TABLE t",
            "TRUNCATE t",
        ] {
            let err = executor.query(sql, None).await.unwrap_err();
            assert!(err.is_permission_denied(), "{sql}");
        }
        assert_eq!(db.call_count(), 0);

        let executor = executor_for(PermissionPolicy::deny_all(), db.clone());
        assert!(executor.query("SHOW TABLES", None).await.is_err());
        assert_eq!(db.call_count(), 0);
    }

    #[tokio::test]
    async fn test_max_rows_truncates() {
        let db = Arc::new(SpyDatabase::with_rows(25));
        let policy = PermissionPolicy {
            max_rows: 10,
            ..PermissionPolicy::new()
        };
        let executor = executor_for(policy, db);

        let response = executor.query("SELECT * FROM t", None).await.unwrap();
        let rows = response.rows.unwrap();
        assert_eq!(rows.len(), 10);
        assert_eq!(response.rowcount, 10);
        assert_eq!(response.truncated, Some(true));
        assert_eq!(rows[0]["id"], json!(0));
        assert_eq!(rows[9]["id"], json!(9));
    }

    #[tokio::test]
    async fn test_multi_statement_rejected_before_driver() {
        let db = Arc::new(SpyDatabase::default());
        let executor = executor_for(PermissionPolicy::allow_all(), db.clone());

        let err = executor
            .query("SELECT 1; DROP TABLE x;", None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MultiStatement));
        assert_eq!(db.call_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_statement_denied_with_all_flags() {
        let db = Arc::new(SpyDatabase::default());
        let executor = executor_for(PermissionPolicy::allow_all(), db.clone());

        for sql in ["BEGIN", "CALL p()", "WITH x AS (SELECT 1) SELECT * FROM x"] {
            let err = executor.query(sql, None).await.unwrap_err();
            assert!(matches!(err, Error::UnknownStatement { .. }), "{sql}");
        }
        assert_eq!(db.call_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_statement_rejected() {
        let db = Arc::new(SpyDatabase::default());
        let executor = executor_for(PermissionPolicy::allow_all(), db.clone());
        assert!(matches!(
            executor.query("   ", None).await,
            Err(Error::EmptyStatement)
        ));
        assert_eq!(db.call_count(), 0);
    }

    #[tokio::test]
    async fn test_insert_reports_last_insert_id() {
        let db = Arc::new(SpyDatabase {
            mutation: Some(DriverOutcome::Mutation {
                affected_rows: 1,
                last_insert_id: Some(42),
            }),
            ..SpyDatabase::default()
        });
        let executor = executor_for(PermissionPolicy::allow_all(), db);

        let response = executor
            .query("INSERT INTO t (name) VALUES ('a')", None)
            .await
            .unwrap();
        assert_eq!(response.kind, StatementCategory::InsertLike);
        assert_eq!(response.rowcount, 1);
        assert_eq!(response.last_insert_id, Some(42));
        assert!(response.rows.is_none());
    }

    #[tokio::test]
    async fn test_update_without_generated_id() {
        let db = Arc::new(SpyDatabase::default());
        let executor = executor_for(PermissionPolicy::allow_all(), db);

        let response = executor.query("UPDATE t SET a = 1", None).await.unwrap();
        assert_eq!(response.kind, StatementCategory::Update);
        assert_eq!(response.last_insert_id, None);
    }

    #[tokio::test]
    async fn test_params_are_bound_not_interpolated() {
        let db = Arc::new(SpyDatabase::with_rows(1));
        let executor = executor_for(PermissionPolicy::new(), db.clone());
        let params: QueryParams = serde_json::from_value(json!({"name": "x'; DROP TABLE t; --"})).unwrap();

        executor
            .query("SELECT * FROM users WHERE name = %(name)s", Some(&params))
            .await
            .unwrap();

        let calls = db.calls.lock();
        assert_eq!(calls[0].0, "SELECT * FROM users WHERE name = ?");
        assert_eq!(calls[0].1, vec![json!("x'; DROP TABLE t; --")]);
    }

    #[tokio::test]
    async fn test_param_mismatch_never_reaches_driver() {
        let db = Arc::new(SpyDatabase::default());
        let executor = executor_for(PermissionPolicy::new(), db.clone());
        let params: QueryParams = serde_json::from_value(json!([1, 2])).unwrap();

        let err = executor
            .query("SELECT ?", Some(&params))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidParams(_)));
        assert_eq!(db.call_count(), 0);
    }

    #[tokio::test]
    async fn test_slow_statement_times_out() {
        let db = Arc::new(SpyDatabase {
            delay: Some(Duration::from_millis(500)),
            ..SpyDatabase::with_rows(1)
        });
        let config = ConfigBuilder::new()
            .query_timeout(Duration::from_millis(20))
            .build()
            .unwrap();
        let executor = Executor::new(&config, db);

        let err = executor.query("SELECT SLEEP(1)", None).await.unwrap_err();
        assert!(err.is_timeout());
    }

    #[test]
    fn test_whoami_redacts_password() {
        let executor = executor_for(PermissionPolicy::new(), Arc::new(SpyDatabase::default()));
        let summary = executor.whoami();
        let serialized = serde_json::to_string(&summary).unwrap();

        assert!(!serialized.contains("s3cr3t-pass"));
        assert_eq!(summary.permissions, PermissionPolicy::new());
        assert_eq!(summary.database.port, 3306);
    }

    #[tokio::test]
    async fn test_health_ok() {
        let db = Arc::new(SpyDatabase::default());
        let executor = executor_for(PermissionPolicy::new(), db.clone());

        assert_eq!(executor.health().await, HealthStatus::healthy());
        assert_eq!(*db.pings.lock(), 1);
    }

    #[tokio::test]
    async fn test_health_reports_driver_failure() {
        let db = Arc::new(SpyDatabase {
            ping_error: true,
            ..SpyDatabase::default()
        });
        let executor = executor_for(PermissionPolicy::new(), db);

        let status = executor.health().await;
        assert!(!status.ok);
        assert!(!status.error.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_health_unreachable_database() {
        let config = ConfigBuilder::new()
            .port(1)
            .connect_timeout(Duration::from_secs(1))
            .pool_size(NonZeroU32::new(1).unwrap())
            .query_timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        let db = Arc::new(MySqlDatabase::new(create_pool(config.database())));
        let executor = Executor::new(&config, db);

        let status = executor.health().await;
        assert!(!status.ok);
        assert!(status.error.is_some_and(|e| !e.is_empty()));
    }
}
