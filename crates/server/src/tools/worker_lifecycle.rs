//! worker_install and worker_activate tool implementations.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use easycal_client::{Worker, WorkerState};

use super::json_result;

/// Output shared by the lifecycle tools.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LifecycleOutput {
    pub version: String,
    /// State after the hook ran.
    pub state: WorkerState,
    /// Generations left in the store.
    pub generations: Vec<String>,
}

async fn lifecycle_output(worker: &Worker, state: WorkerState) -> Result<CallToolResult, McpError> {
    let output = LifecycleOutput {
        version: worker.config().version.clone(),
        state,
        generations: worker.db().list_generations().await?,
    };
    json_result(&output)
}

pub async fn install_impl(worker: &Worker) -> Result<CallToolResult, McpError> {
    let state = worker.install().await?;
    lifecycle_output(worker, state).await
}

pub async fn activate_impl(worker: &Worker) -> Result<CallToolResult, McpError> {
    let state = worker.activate().await?;
    lifecycle_output(worker, state).await
}
