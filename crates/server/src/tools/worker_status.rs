//! worker_status tool implementation.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use easycal_client::{Client, Worker, WorkerState};
use easycal_core::cache::GenerationInfo;

use super::json_result;

/// Parameters for the worker_status tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct WorkerStatusParams {
    /// Include connected clients in the output.
    #[serde(default)]
    pub include_clients: bool,
}

/// Output from the worker_status tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct WorkerStatusOutput {
    pub state: WorkerState,
    pub version: String,
    pub origin: String,
    /// Generations currently in the store, oldest first.
    pub generations: Vec<GenerationInfo>,
    pub manifest_entries: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clients: Option<Vec<Client>>,
    pub checked_at: String,
}

pub async fn status_impl(worker: &Worker, params: WorkerStatusParams) -> Result<CallToolResult, McpError> {
    let generations = worker.db().generation_infos().await?;
    let clients = if params.include_clients { Some(worker.clients().match_all(true).await) } else { None };

    let output = WorkerStatusOutput {
        state: worker.state(),
        version: worker.config().version.clone(),
        origin: worker.config().origin().to_string(),
        generations,
        manifest_entries: worker.config().manifest.len(),
        clients,
        checked_at: chrono::Utc::now().to_rfc3339(),
    };

    json_result(&output)
}
