//! cache_get tool implementation.
//!
//! Retrieves one stored entry by request key.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use easycal_client::Worker;
use easycal_core::{Error, RequestKey};

use crate::tools::{BodyEncoding, encode_body, json_result};

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// Request key (absolute path plus query, e.g. "/tools/bmi.html") or a
    /// full URL on the worker's origin.
    pub key: String,

    /// Generation to read from (default: the current version).
    #[serde(default)]
    pub generation: Option<String>,
}

/// Output from the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetOutput {
    pub generation: String,
    pub key: RequestKey,
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub headers: Vec<(String, String)>,
    pub body: String,
    pub body_encoding: BodyEncoding,
    pub body_sha256: String,
    pub stored_at: String,
}

/// Implementation of the cache_get tool.
pub async fn get_impl(worker: &Worker, params: CacheGetParams) -> Result<CallToolResult, McpError> {
    let (_, key) = RequestKey::resolve(worker.config().origin(), &params.key)?;
    let generation = match params.generation {
        Some(name) => worker.db().generation(&name),
        None => worker.current_generation(),
    };

    let entry = generation
        .entry(&key)
        .await?
        .ok_or_else(|| Error::CacheMiss(format!("{key} in {}", generation.name())))?;

    let (body, body_encoding) = encode_body(&entry.response.body);
    let output = CacheGetOutput {
        generation: generation.name().to_string(),
        content_type: entry.response.content_type().map(str::to_string),
        key: entry.key,
        url: entry.url,
        status: entry.response.status,
        headers: entry.response.headers,
        body,
        body_encoding,
        body_sha256: entry.body_sha256,
        stored_at: entry.stored_at,
    };

    json_result(&output)
}
