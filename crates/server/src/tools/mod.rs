//! MCP tool implementations.
//!
//! Every tool returns its output as pretty-printed JSON text content.

pub mod cache;
pub mod client_messages;
pub mod worker_fetch;
pub mod worker_lifecycle;
pub mod worker_message;
pub mod worker_status;

#[cfg(test)]
pub(crate) mod testing;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::ToolError;

/// How a body is carried in tool output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum BodyEncoding {
    Utf8,
    Base64,
}

/// Body as text when it is valid UTF-8, base64 otherwise.
pub fn encode_body(body: &[u8]) -> (String, BodyEncoding) {
    match std::str::from_utf8(body) {
        Ok(text) => (text.to_string(), BodyEncoding::Utf8),
        Err(_) => (STANDARD.encode(body), BodyEncoding::Base64),
    }
}

pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json =
        serde_json::to_string_pretty(output).map_err(|e| ToolError::OutputFailed(format!("failed to serialize: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_text_body() {
        let (body, encoding) = encode_body(b"<h1>EasyCal</h1>");
        assert_eq!(body, "<h1>EasyCal</h1>");
        assert_eq!(encoding, BodyEncoding::Utf8);
    }

    #[test]
    fn test_encode_binary_body() {
        let (body, encoding) = encode_body(&[0x89, 0x50, 0x4e, 0x47, 0xff]);
        assert_eq!(encoding, BodyEncoding::Base64);
        assert_eq!(STANDARD.decode(body).unwrap(), vec![0x89, 0x50, 0x4e, 0x47, 0xff]);
    }
}
