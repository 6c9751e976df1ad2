//! MCP server implementation

use std::fmt;
use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::{Json, Parameters};
use rmcp::model::{ServerCapabilities, ServerInfo};
use rmcp::{ErrorData, ServerHandler as RmcpServerHandler, tool, tool_handler, tool_router};

use crate::executor::Executor;
use crate::types::{ConnectionSummary, HealthStatus, QueryResponse, QueryToolParams, ToolResult};

pub struct ServerHandler {
    executor: Arc<Executor>,
    tool_router: ToolRouter<Self>,
}

impl Clone for ServerHandler {
    fn clone(&self) -> Self {
        Self {
            executor: Arc::clone(&self.executor),
            tool_router: Self::tool_router(),
        }
    }
}

impl fmt::Debug for ServerHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerHandler")
            .field("executor", &self.executor)
            .field("tool_router", &"<ToolRouter>")
            .finish()
    }
}

impl ServerHandler {
    pub fn new(executor: Executor) -> Self {
        Self {
            executor: Arc::new(executor),
            tool_router: Self::tool_router(),
        }
    }
}

#[tool_router]
impl ServerHandler {
    #[tool(
        description = "Execute a single SQL statement on the configured MySQL instance. Permissions (select/insert/update/delete/ddl) are enforced by server config."
    )]
    async fn query(
        &self,
        Parameters(params): Parameters<QueryToolParams>,
    ) -> ToolResult<QueryResponse> {
        self.executor
            .query(&params.sql, params.params.as_ref())
            .await
            .map(Json)
            .map_err(ErrorData::from)
    }

    #[tool(description = "Return connection and permission summary (no secrets).")]
    async fn whoami(&self) -> ToolResult<ConnectionSummary> {
        Ok(Json(self.executor.whoami()))
    }

    #[tool(description = "Ping the database and report whether it is reachable")]
    async fn health(&self) -> ToolResult<HealthStatus> {
        Ok(Json(self.executor.health().await))
    }
}

#[tool_handler]
impl RmcpServerHandler for ServerHandler {
    fn get_info(&self) -> ServerInfo {
        ServerInfo::new(ServerCapabilities::builder().enable_tools().build()).with_instructions(
            "MCP server for MySQL and MariaDB. Runs single SQL statements under a configured permission policy.",
        )
    }
}
