//! Pages connected to the worker.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use schemars::JsonSchema;
use serde::Serialize;
use tokio::sync::{RwLock, mpsc};

use easycal_core::WorkerMessage;

/// A connected page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct Client {
    pub id: String,
    pub url: String,
    /// Cache version controlling this page, once claimed.
    pub controller: Option<String>,
}

struct ClientEntry {
    client: Client,
    sender: mpsc::UnboundedSender<WorkerMessage>,
}

/// Registry of connected pages.
///
/// Cheap to clone; clones share the registry.
#[derive(Clone, Default)]
pub struct Clients {
    inner: Arc<RwLock<HashMap<String, ClientEntry>>>,
    next_id: Arc<AtomicU64>,
}

impl Clients {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a page. Messages for it arrive on the returned receiver.
    pub async fn connect(&self, url: impl Into<String>) -> (Client, mpsc::UnboundedReceiver<WorkerMessage>) {
        let id = format!("client-{}", self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let client = Client { id: id.clone(), url: url.into(), controller: None };
        let (sender, receiver) = mpsc::unbounded_channel();

        self.inner
            .write()
            .await
            .insert(id, ClientEntry { client: client.clone(), sender });

        tracing::debug!("client {} connected from {}", client.id, client.url);
        (client, receiver)
    }

    pub async fn get(&self, id: &str) -> Option<Client> {
        self.inner.read().await.get(id).map(|entry| entry.client.clone())
    }

    /// Connected pages, optionally only those already controlled.
    pub async fn match_all(&self, include_uncontrolled: bool) -> Vec<Client> {
        let mut clients: Vec<Client> = self
            .inner
            .read()
            .await
            .values()
            .filter(|entry| include_uncontrolled || entry.client.controller.is_some())
            .map(|entry| entry.client.clone())
            .collect();
        clients.sort_by(|a, b| a.id.cmp(&b.id));
        clients
    }

    /// Take control of every connected page. Returns how many were claimed.
    pub async fn claim(&self, version: &str) -> usize {
        let mut inner = self.inner.write().await;
        for entry in inner.values_mut() {
            entry.client.controller = Some(version.to_string());
        }
        inner.len()
    }

    /// Send `message` to every page, dropping pages that went away.
    ///
    /// Returns the number of pages reached.
    pub async fn broadcast(&self, message: &WorkerMessage) -> usize {
        let mut inner = self.inner.write().await;
        inner.retain(|id, entry| {
            let alive = entry.sender.send(message.clone()).is_ok();
            if !alive {
                tracing::debug!("client {} gone, removing", id);
            }
            alive
        });
        inner.len()
    }
}
