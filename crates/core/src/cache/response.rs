//! Captured responses.

use bytes::Bytes;

/// An immutable snapshot of a response as it was served or stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers in the order they were received.
    pub headers: Vec<(String, String)>,
    /// Response body bytes.
    pub body: Bytes,
}

impl CapturedResponse {
    pub fn new(status: u16, headers: Vec<(String, String)>, body: impl Into<Bytes>) -> Self {
        Self { status, headers, body: body.into() }
    }

    /// Response with a single `Content-Type` header.
    pub fn with_content_type(status: u16, content_type: &str, body: impl Into<Bytes>) -> Self {
        Self::new(status, vec![("content-type".to_string(), content_type.to_string())], body)
    }

    /// Synthesized response for a request neither cache nor network could satisfy.
    pub fn network_error() -> Self {
        Self::with_content_type(408, "text/plain; charset=utf-8", "Network error")
    }

    /// Empty response with the given status.
    pub fn empty(status: u16) -> Self {
        Self::new(status, Vec::new(), Bytes::new())
    }

    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// First header value with the given name, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }
}
