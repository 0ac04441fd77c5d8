//! cache_purge tool implementation.
//!
//! Deletes a single key, or a whole stale generation.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use easycal_client::Worker;
use easycal_core::RequestKey;

use crate::error::ToolError;
use crate::tools::json_result;

/// Parameters for the cache_purge tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeParams {
    /// Delete this key. Applies to `generation` if given, else to the
    /// current version.
    pub key: Option<String>,

    /// Without `key`: delete this whole generation. The current version
    /// cannot be deleted this way.
    pub generation: Option<String>,
}

/// Output from the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeOutput {
    pub generation: String,
    /// Number of keys or generations deleted.
    pub deleted: u64,
}

/// Implementation of the cache_purge tool.
pub async fn purge_impl(worker: &Worker, params: CachePurgeParams) -> Result<CallToolResult, McpError> {
    let current = &worker.config().version;

    let output = match (params.key, params.generation) {
        (Some(key), generation) => {
            let (_, key) = RequestKey::resolve(worker.config().origin(), &key)?;
            let generation = match generation {
                Some(name) => worker.db().generation(&name),
                None => worker.current_generation(),
            };
            let deleted = generation.delete(&key).await?;
            tracing::info!("purged {} from {}", key, generation.name());
            CachePurgeOutput { generation: generation.name().to_string(), deleted: u64::from(deleted) }
        }
        (None, Some(name)) => {
            if name == *current {
                return Err(ToolError::InvalidInput(format!(
                    "{name} is the current version; bump cache_version to replace it"
                ))
                .into());
            }
            let deleted = worker.db().delete_generation(&name).await?;
            tracing::info!("purged generation {}", name);
            CachePurgeOutput { generation: name, deleted: u64::from(deleted) }
        }
        (None, None) => {
            return Err(ToolError::InvalidInput("at least one of key or generation must be specified".into()).into());
        }
    };

    json_result(&output)
}
