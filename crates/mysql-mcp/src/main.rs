use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use mysql_mcp::config;
use mysql_mcp::observability::init_observability;
use mysql_mcp::transport::run_transport;
use mysql_mcp::{Executor, MySqlDatabase, ServerHandler, create_pool};

#[derive(Parser, Debug)]
#[command(name = "mysql-mcp")]
#[command(about = "MCP server for MySQL and MariaDB", long_about = None)]
#[command(version)]
struct Args {
    /// Configuration file path (default: $DB_MCP_CONFIG, then ./config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Enable JSON logging output
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // File, then environment, then these flags
    let mut builder = config::load_config(args.config.as_deref())?;

    if args.verbose {
        builder = builder.log_level("debug".to_string());
    }

    if args.json_logs {
        builder = builder.json_logs(true);
    }

    let config = builder.build()?;

    init_observability(&config.telemetry)?;

    let pool = create_pool(config.database());
    let executor = Executor::new(&config, Arc::new(MySqlDatabase::new(pool.clone())));
    let handler = ServerHandler::new(executor);

    let db = config.database();
    let policy = config.permissions();
    tracing::info!(
        host = %db.host,
        port = db.port,
        user = %db.user,
        database = %db.database,
        "Starting MCP server for MySQL"
    );
    tracing::info!(
        select = policy.select,
        insert = policy.insert,
        update = policy.update,
        delete = policy.delete,
        ddl = policy.ddl,
        max_rows = policy.max_rows,
        "Permission policy"
    );
    tracing::info!("Query timeout: {:?}", config.query_timeout());

    let shutdown = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Shutdown signal received"),
            Err(e) => {
                tracing::error!(error = %e, "Failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        }
    };

    let result = run_transport(handler, shutdown).await;

    pool.close().await;

    result.map_err(Into::into)
}
