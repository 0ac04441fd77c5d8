//! Fixtures for tool tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use rmcp::model::CallToolResult;
use serde::de::DeserializeOwned;
use url::Url;

use easycal_client::{Network, Worker};
use easycal_core::{AppConfig, CacheDb, CapturedResponse, Error, RequestKey};

/// Serves fixed responses by path; anything else is unreachable.
#[derive(Default)]
pub struct StaticNetwork {
    pages: HashMap<String, CapturedResponse>,
}

impl StaticNetwork {
    pub fn with(mut self, path: &str, content_type: &str, body: &[u8]) -> Self {
        self.pages
            .insert(path.to_string(), CapturedResponse::with_content_type(200, content_type, body.to_vec()));
        self
    }
}

#[async_trait]
impl Network for StaticNetwork {
    async fn fetch(&self, url: &Url) -> Result<CapturedResponse, Error> {
        let key = RequestKey::from_url(url);
        self.pages
            .get(key.as_str())
            .cloned()
            .ok_or_else(|| Error::Network(format!("{url}: unreachable")))
    }
}

pub fn manifest_network() -> StaticNetwork {
    StaticNetwork::default()
        .with("/", "text/html", b"home")
        .with("/offline.html", "text/html", b"offline")
        .with("/tools/error.html", "text/html", b"tool error")
        .with("/tools/bmi.html", "text/html", b"bmi")
        .with("/images/logo.png", "image/png", &[0x89, 0x50, 0x4e, 0x47, 0xff])
}

pub async fn worker(network: StaticNetwork) -> Arc<Worker> {
    let app = AppConfig {
        origin: "http://localhost:8080/".into(),
        manifest: vec![
            "/".into(),
            "/offline.html".into(),
            "/tools/error.html".into(),
            "/tools/bmi.html".into(),
            "/images/logo.png".into(),
        ],
        ..Default::default()
    };
    let db = CacheDb::open_in_memory().await.unwrap();
    Arc::new(Worker::new(app.worker_config().unwrap(), db, Arc::new(network)))
}

pub async fn active_worker() -> Arc<Worker> {
    let worker = worker(manifest_network()).await;
    worker.register().await.unwrap();
    worker
}

/// Decode the JSON text content of a tool result.
pub fn output<T: DeserializeOwned>(result: &CallToolResult) -> T {
    let content = serde_json::to_value(&result.content[0]).unwrap();
    let text = content.get("text").and_then(|v| v.as_str()).expect("expected text content");
    serde_json::from_str(text).unwrap()
}
