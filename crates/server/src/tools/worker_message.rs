//! worker_message and worker_sync tool implementations.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use easycal_client::Worker;
use easycal_core::BackgroundTrigger;

use super::json_result;

/// Parameters for the worker_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerMessageParams {
    /// Page message, e.g. `{"type": "CACHE_TOOLS", "tools": ["/tools/bmi.html"]}`
    /// or `{"type": "SKIP_WAITING"}`. Anything else is ignored.
    pub message: serde_json::Value,
}

pub async fn message_impl(worker: &Worker, params: WorkerMessageParams) -> Result<CallToolResult, McpError> {
    let outcome = worker.handle_message(&params.message).await;
    json_result(&outcome)
}

/// Parameters for the worker_sync tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerSyncParams {
    /// Sync tag: "sync-user-data" or "check-expiry-daily".
    pub tag: String,
}

/// Output from the worker_sync tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerSyncOutput {
    pub tag: String,
    /// Whether the tag maps to a background trigger.
    pub recognized: bool,
    pub clients_notified: usize,
}

pub async fn sync_impl(worker: &Worker, params: WorkerSyncParams) -> Result<CallToolResult, McpError> {
    let recognized = BackgroundTrigger::from_tag(&params.tag).is_some();
    let clients_notified = worker.handle_sync(&params.tag).await;

    json_result(&WorkerSyncOutput { tag: params.tag, recognized, clients_notified })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{active_worker, output};
    use serde_json::{Value, json};

    #[tokio::test]
    async fn test_cache_tools_message() {
        let worker = active_worker().await;
        let params = WorkerMessageParams { message: json!({"type": "CACHE_TOOLS", "tools": ["/", "/tools/nope.html"]}) };

        let out: Value = output(&message_impl(&worker, params).await.unwrap());
        assert_eq!(out["outcome"], "cached_tools");
        assert_eq!(out["report"]["cached"], json!(["/"]));
        assert_eq!(out["report"]["failed"], json!(["/tools/nope.html"]));
    }

    #[tokio::test]
    async fn test_unknown_message() {
        let worker = active_worker().await;
        let params = WorkerMessageParams { message: json!({"type": "LOGOUT"}) };

        let out: Value = output(&message_impl(&worker, params).await.unwrap());
        assert_eq!(out["outcome"], "ignored");
    }

    #[tokio::test]
    async fn test_sync_reaches_clients() {
        let worker = active_worker().await;
        let (_, mut rx) = worker.clients().connect("http://localhost:8080/dashboard.html").await;

        let params = WorkerSyncParams { tag: "check-expiry-daily".into() };
        let out: WorkerSyncOutput = output(&sync_impl(&worker, params).await.unwrap());
        assert!(out.recognized);
        assert_eq!(out.clients_notified, 1);
        assert!(rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_unknown_tag() {
        let worker = active_worker().await;
        let params = WorkerSyncParams { tag: "nightly".into() };
        let out: WorkerSyncOutput = output(&sync_impl(&worker, params).await.unwrap());
        assert!(!out.recognized);
        assert_eq!(out.clients_notified, 0);
    }
}
