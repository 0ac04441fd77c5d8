//! Scripted network and worker fixtures shared by the worker tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use url::Url;

use easycal_core::{AppConfig, CacheDb, CapturedResponse, Error, RequestKey, WorkerConfig};

use crate::fetch::Network;
use crate::worker::Worker;

pub const ORIGIN: &str = "http://localhost:8080/";

#[derive(Clone)]
enum Reply {
    Respond(CapturedResponse),
    Fail,
}

/// Network double keyed by request path. Unscripted paths fail like an
/// unreachable host.
#[derive(Default)]
pub struct MockNetwork {
    replies: Mutex<HashMap<String, Reply>>,
    calls: Mutex<Vec<String>>,
}

impl MockNetwork {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, path: &str, status: u16, content_type: &str, body: &str) {
        let response = CapturedResponse::with_content_type(status, content_type, body.to_string());
        self.replies.lock().unwrap().insert(path.to_string(), Reply::Respond(response));
    }

    pub fn fail(&self, path: &str) {
        self.replies.lock().unwrap().insert(path.to_string(), Reply::Fail);
    }

    pub fn calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_to(&self, path: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|p| p.as_str() == path).count()
    }
}

#[async_trait]
impl Network for MockNetwork {
    async fn fetch(&self, url: &Url) -> Result<CapturedResponse, Error> {
        let key = RequestKey::from_url(url).to_string();
        self.calls.lock().unwrap().push(key.clone());
        let reply = self.replies.lock().unwrap().get(&key).cloned();
        match reply {
            Some(Reply::Respond(response)) => Ok(response),
            Some(Reply::Fail) | None => Err(Error::Network(format!("{url}: connection refused"))),
        }
    }
}

/// A small manifest that still carries both fallback pages.
pub fn small_manifest() -> Vec<String> {
    ["/", "/index.html", "/css/style.css", "/offline.html", "/tools/error.html", "/tools/bmi.html"]
        .into_iter()
        .map(String::from)
        .collect()
}

pub fn worker_config(version: &str, skip_waiting: bool) -> WorkerConfig {
    let app = AppConfig {
        origin: ORIGIN.to_string(),
        cache_version: version.to_string(),
        manifest: small_manifest(),
        skip_waiting_on_install: skip_waiting,
        ..Default::default()
    };
    app.worker_config().unwrap()
}

/// Script a 200 for every entry in the small manifest.
pub fn serve_manifest(network: &MockNetwork) {
    for path in small_manifest() {
        let content_type = if path.ends_with(".css") { "text/css" } else { "text/html" };
        network.respond(&path, 200, content_type, &format!("manifest {path}"));
    }
}

pub async fn worker(version: &str, network: Arc<MockNetwork>) -> (Worker, CacheDb) {
    let db = CacheDb::open_in_memory().await.unwrap();
    let worker = Worker::new(worker_config(version, true), db.clone(), network);
    (worker, db)
}

/// Worker whose generation is installed and active.
pub async fn active_worker(network: Arc<MockNetwork>) -> (Worker, CacheDb) {
    serve_manifest(&network);
    let (worker, db) = worker("easycal-v2.0", network).await;
    worker.install().await.unwrap();
    (worker, db)
}

pub fn url(path: &str) -> Url {
    Url::parse(ORIGIN).unwrap().join(path).unwrap()
}
