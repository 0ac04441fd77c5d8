//! The request model the worker intercepts.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use url::Url;

use easycal_core::RequestKey;

/// How the page issued the request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum RequestMode {
    /// Top-level page load.
    Navigate,
    #[default]
    SameOrigin,
    NoCors,
    Cors,
}

/// What the response is going to be used for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    /// `fetch()` / XHR.
    #[default]
    #[serde(rename = "")]
    Empty,
    Document,
    Iframe,
    Image,
    Script,
    Style,
    Font,
    Manifest,
    Worker,
}

/// An outgoing request offered to the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: Url,
    pub method: String,
    pub mode: RequestMode,
    pub destination: Destination,
}

impl FetchRequest {
    /// A plain GET with default mode and no destination.
    pub fn get(url: Url) -> Self {
        Self { url, method: "GET".to_string(), mode: RequestMode::default(), destination: Destination::default() }
    }

    /// A top-level navigation.
    pub fn navigate(url: Url) -> Self {
        Self { mode: RequestMode::Navigate, destination: Destination::Document, ..Self::get(url) }
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    pub fn is_get(&self) -> bool {
        self.method.eq_ignore_ascii_case("GET")
    }

    /// Cache identity of this request.
    pub fn key(&self) -> RequestKey {
        RequestKey::from_url(&self.url)
    }
}
