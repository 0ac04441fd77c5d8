//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the worker hooks.
use std::sync::Arc;

use crate::tools::cache::{CacheGetParams, CachePurgeParams, get_impl, purge_impl};
use crate::tools::client_messages::{Inbox, messages_impl};
use crate::tools::worker_fetch::{WorkerFetchParams, fetch_impl};
use crate::tools::worker_lifecycle::{activate_impl, install_impl};
use crate::tools::worker_message::{WorkerMessageParams, WorkerSyncParams, message_impl, sync_impl};
use crate::tools::worker_status::{WorkerStatusParams, status_impl};

use easycal_client::Worker;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The MCP server handler for the cache worker host.
#[derive(Clone)]
pub struct WorkerServer {
    worker: Arc<Worker>,
    inbox: Arc<Inbox>,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
#[tool_router]
impl WorkerServer {
    /// Create a new server handler around a booted worker.
    pub fn new(worker: Arc<Worker>, inbox: Inbox) -> Self {
        Self { worker, inbox: Arc::new(inbox), tool_router: Self::tool_router() }
    }

    #[tool(description = "Report the worker lifecycle state, cache version and stored generations.")]
    async fn worker_status(&self, params: Parameters<WorkerStatusParams>) -> Result<CallToolResult, McpError> {
        status_impl(&self.worker, params.0).await
    }

    #[tool(description = "Fetch the asset manifest and store it as the current cache generation.")]
    async fn worker_install(&self) -> Result<CallToolResult, McpError> {
        install_impl(&self.worker).await
    }

    #[tool(description = "Activate the installed generation: delete stale generations and claim clients.")]
    async fn worker_activate(&self) -> Result<CallToolResult, McpError> {
        activate_impl(&self.worker).await
    }

    /// Intercept a request as a page would issue it.
    ///
    /// Returns the route class, the strategy used and the response. Bodies that
    /// are not UTF-8 are base64 encoded.
    #[tool(description = "Offer a request to the worker. Returns route, strategy and response (UTF-8 or base64 body).")]
    async fn worker_fetch(&self, params: Parameters<WorkerFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.worker, params.0).await
    }

    #[tool(description = "Deliver a page message (CACHE_TOOLS or SKIP_WAITING) to the worker.")]
    async fn worker_message(&self, params: Parameters<WorkerMessageParams>) -> Result<CallToolResult, McpError> {
        message_impl(&self.worker, params.0).await
    }

    #[tool(description = "Fire a background sync by tag (sync-user-data, check-expiry-daily).")]
    async fn worker_sync(&self, params: Parameters<WorkerSyncParams>) -> Result<CallToolResult, McpError> {
        sync_impl(&self.worker, params.0).await
    }

    #[tool(description = "Drain messages the worker sent to this host's client connection.")]
    async fn client_messages(&self) -> Result<CallToolResult, McpError> {
        messages_impl(&self.inbox).await
    }

    #[tool(description = "Inspect one stored cache entry by request key.")]
    async fn cache_get(&self, params: Parameters<CacheGetParams>) -> Result<CallToolResult, McpError> {
        get_impl(&self.worker, params.0).await
    }

    #[tool(description = "Delete one key from a generation, or a whole stale generation.")]
    async fn cache_purge(&self, params: Parameters<CachePurgeParams>) -> Result<CallToolResult, McpError> {
        purge_impl(&self.worker, params.0).await
    }
}

impl ServerHandler for WorkerServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "easycal-sw".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
