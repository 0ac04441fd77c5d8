//! worker_fetch tool implementation.
//!
//! Offers a request to the worker the way a page would issue it. Requests
//! the worker does not intercept are forwarded to the network directly when
//! they are GETs on the worker's origin; anything else is reported as not
//! intercepted with no response.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use easycal_client::fetch::{canonicalize, same_origin};
use easycal_client::{Destination, FetchRequest, Interception, RequestMode, RouteClass, Worker};
use easycal_core::{CapturedResponse, Error};

use super::{BodyEncoding, encode_body, json_result};

/// Parameters for the worker_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerFetchParams {
    /// Absolute URL, or a path resolved against the worker's origin.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Request mode: "navigate", "same-origin" (default), "no-cors" or "cors".
    #[serde(default)]
    pub mode: RequestMode,

    /// Request destination, e.g. "image", "script", "style" (default: "").
    #[serde(default)]
    pub destination: Destination,
}

fn default_method() -> String {
    "GET".into()
}

/// A response as returned to the caller.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ResponseView {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
    pub body_encoding: BodyEncoding,
}

impl From<&CapturedResponse> for ResponseView {
    fn from(response: &CapturedResponse) -> Self {
        let (body, body_encoding) = encode_body(&response.body);
        Self { status: response.status, headers: response.headers.clone(), body, body_encoding }
    }
}

/// Output from the worker_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerFetchOutput {
    pub url: String,
    /// Whether the worker answered the request.
    pub intercepted: bool,
    pub route: Option<RouteClass>,
    pub strategy: Option<String>,
    pub response: Option<ResponseView>,
}

pub async fn fetch_impl(worker: &Worker, params: WorkerFetchParams) -> Result<CallToolResult, McpError> {
    let url = canonicalize(worker.config().origin(), &params.url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
    let request = FetchRequest::get(url.clone())
        .with_method(params.method)
        .with_mode(params.mode)
        .with_destination(params.destination);

    let output = match worker.handle_fetch(&request).await {
        Interception::Respond { route, strategy, response } => WorkerFetchOutput {
            url: url.to_string(),
            intercepted: true,
            route: Some(route),
            strategy: Some(strategy.to_string()),
            response: Some(ResponseView::from(&response)),
        },
        Interception::Passthrough => {
            let forward = request.is_get() && same_origin(&url, worker.config().origin());
            let response = if forward { Some(worker.network().fetch(&url).await?) } else { None };
            WorkerFetchOutput {
                url: url.to_string(),
                intercepted: false,
                route: None,
                strategy: None,
                response: response.as_ref().map(ResponseView::from),
            }
        }
    };

    json_result(&output)
}
