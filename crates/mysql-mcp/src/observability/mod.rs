//! Observability module for logging and metrics

#[cfg(feature = "metrics")]
mod metrics;

#[cfg(feature = "metrics")]
pub use metrics::{init_metrics, record_denial, record_health_check, record_rows, record_statement};
use tracing_subscriber::EnvFilter;

use crate::Result;
use crate::config::TelemetryConfig;
use crate::error::Error;

/// Initialize logging and, with the `metrics` feature, the Prometheus exporter
pub fn init_observability(config: &TelemetryConfig) -> Result<()> {
    init_logging(config)?;

    #[cfg(feature = "metrics")]
    if let Some(addr) = config.metrics_addr {
        init_metrics(addr)?;
    }

    #[cfg(not(feature = "metrics"))]
    if config.metrics_addr.is_some() {
        tracing::warn!("metrics_addr is set but the metrics feature is not compiled in");
    }

    Ok(())
}

/// Filter from `RUST_LOG` when set, otherwise from the configured level
fn env_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level))
}

/// Logs go to stderr; stdout carries the stdio transport
fn init_logging(config: &TelemetryConfig) -> Result<()> {
    use tracing_subscriber::Layer;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let fmt_layer = if config.json_logs {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_ansi(false)
            .with_writer(std::io::stderr)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter(&config.log_level))
        .with(fmt_layer)
        .try_init()
        .map_err(|e| Error::Config(format!("Failed to initialize logging: {e}")))
}
