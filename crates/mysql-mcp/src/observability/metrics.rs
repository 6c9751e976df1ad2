//! Prometheus metrics for mysql-mcp

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::Result;
use crate::error::Error;

const METRIC_INFO: &str = "mysql_mcp_info";

// Statement metrics
const METRIC_STATEMENTS: &str = "mysql_mcp_statements_total";
const METRIC_STATEMENT_DURATION: &str = "mysql_mcp_statement_duration_seconds";
const METRIC_ROWS: &str = "mysql_mcp_rows_returned_total";
const METRIC_TRUNCATIONS: &str = "mysql_mcp_truncated_results_total";
const METRIC_DENIALS: &str = "mysql_mcp_denials_total";

// Health metrics
const METRIC_HEALTH_CHECKS: &str = "mysql_mcp_health_checks_total";

/// Install the Prometheus recorder and its HTTP listener on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| Error::Config(format!("Failed to install metrics exporter: {e}")))?;

    register_metrics();
    tracing::info!(%addr, "Prometheus metrics listener started");
    Ok(())
}

fn register_metrics() {
    describe_gauge!(METRIC_INFO, "Server information (always 1)");

    describe_counter!(
        METRIC_STATEMENTS,
        "Statements processed by category and outcome"
    );
    describe_histogram!(
        METRIC_STATEMENT_DURATION,
        "Statement execution duration in seconds"
    );
    describe_counter!(METRIC_ROWS, "Total rows returned to clients");
    describe_counter!(METRIC_TRUNCATIONS, "Row-sets cut down to max_rows");
    describe_counter!(METRIC_DENIALS, "Statements rejected by the policy guard");

    describe_counter!(METRIC_HEALTH_CHECKS, "Health checks by result");

    gauge!(
        METRIC_INFO,
        "version" => env!("CARGO_PKG_VERSION"),
    )
    .set(1.0);
}

/// Record a statement that reached the database
pub fn record_statement(category: &str, outcome: &str, duration: Duration) {
    histogram!(
        METRIC_STATEMENT_DURATION,
        "category" => category.to_owned(),
    )
    .record(duration.as_secs_f64());

    counter!(
        METRIC_STATEMENTS,
        "category" => category.to_owned(),
        "outcome" => outcome.to_owned(),
    )
    .increment(1);
}

/// Record rows handed back for a row-returning statement
pub fn record_rows(count: u64, truncated: bool) {
    counter!(METRIC_ROWS).increment(count);
    if truncated {
        counter!(METRIC_TRUNCATIONS).increment(1);
    }
}

/// Record a statement rejected before execution
pub fn record_denial(kind: &str) {
    counter!(METRIC_DENIALS, "kind" => kind.to_owned()).increment(1);
}

/// Record the result of a health check
pub fn record_health_check(ok: bool) {
    let result = if ok { "ok" } else { "error" };
    counter!(METRIC_HEALTH_CHECKS, "result" => result.to_owned()).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_statement("select", "success", Duration::from_millis(3));
        record_rows(10, true);
        record_denial("permission_denied");
        record_health_check(false);
    }
}
