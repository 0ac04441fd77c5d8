//! Page messages and background triggers.

use schemars::JsonSchema;
use serde::Serialize;
use serde_json::Value;

use easycal_core::{BackgroundTrigger, PageMessage, RequestKey};

use super::Worker;
use super::lifecycle::WorkerState;

/// Result of a `CACHE_TOOLS` request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, JsonSchema)]
pub struct CacheToolsReport {
    /// Keys now present in the current generation.
    pub cached: Vec<RequestKey>,
    /// Inputs that were skipped, as given.
    pub failed: Vec<String>,
}

/// What a page message led to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MessageOutcome {
    /// Malformed or unknown payload.
    Ignored,
    SkipWaiting { state: WorkerState },
    CachedTools { report: CacheToolsReport },
}

impl Worker {
    /// Message-receive hook. Never fails; bad payloads are dropped.
    pub async fn handle_message(&self, payload: &Value) -> MessageOutcome {
        let Some(message) = PageMessage::from_value(payload) else {
            tracing::debug!("ignoring message {}", payload);
            return MessageOutcome::Ignored;
        };

        match message {
            PageMessage::SkipWaiting => {
                let state = match self.skip_waiting().await {
                    Ok(state) => state,
                    Err(e) => {
                        tracing::warn!("skip waiting failed: {}", e);
                        self.state()
                    }
                };
                MessageOutcome::SkipWaiting { state }
            }
            PageMessage::CacheTools { tools } => MessageOutcome::CachedTools { report: self.cache_tools(&tools).await },
        }
    }

    /// Fetch and store each tool page, one after another.
    ///
    /// Only 2xx responses are stored. Failures are logged and skipped
    /// without affecting the rest of the list.
    pub async fn cache_tools(&self, tools: &[String]) -> CacheToolsReport {
        let mut report = CacheToolsReport::default();

        if !matches!(self.state(), WorkerState::Installed | WorkerState::Activating | WorkerState::Active) {
            tracing::warn!("ignoring CACHE_TOOLS while {}", self.state().as_str());
            report.failed = tools.to_vec();
            return report;
        }

        let generation = self.current_generation();
        for input in tools {
            let (url, key) = match RequestKey::resolve(self.config().origin(), input) {
                Ok(resolved) => resolved,
                Err(e) => {
                    tracing::warn!("skipping tool {}: {}", input, e);
                    report.failed.push(input.clone());
                    continue;
                }
            };

            let response = match self.network().fetch(&url).await {
                Ok(response) if response.is_success() => response,
                Ok(response) => {
                    tracing::warn!("skipping tool {}: HTTP {}", key, response.status);
                    report.failed.push(input.clone());
                    continue;
                }
                Err(e) => {
                    tracing::warn!("skipping tool {}: {}", key, e);
                    report.failed.push(input.clone());
                    continue;
                }
            };

            match generation.put(&key, url.as_str(), &response).await {
                Ok(()) => {
                    tracing::debug!("cached tool {}", key);
                    report.cached.push(key);
                }
                Err(e) => {
                    tracing::warn!("could not store tool {}: {}", key, e);
                    report.failed.push(input.clone());
                }
            }
        }

        report
    }

    /// Background-event hook. Returns the number of pages notified.
    pub async fn handle_sync(&self, tag: &str) -> usize {
        let Some(trigger) = BackgroundTrigger::from_tag(tag) else {
            tracing::debug!("ignoring sync tag {}", tag);
            return 0;
        };

        let reached = self.clients().broadcast(&trigger.message()).await;
        tracing::info!("sync {} reached {} clients", tag, reached);
        reached
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockNetwork, active_worker, worker};
    use easycal_core::WorkerMessage;
    use serde_json::json;

    #[tokio::test]
    async fn test_cache_tools_stores_successes() {
        let network = MockNetwork::new();
        let (worker, _db) = active_worker(network.clone()).await;
        network.respond("/tools/loan.html", 200, "text/html", "loan");
        network.respond("/tools/tax.html", 404, "text/html", "missing");

        let outcome = worker
            .handle_message(&json!({
                "type": "CACHE_TOOLS",
                "tools": ["/tools/loan.html", "/tools/tax.html", "/tools/down.html", "https://evil.example/x.html"]
            }))
            .await;

        let MessageOutcome::CachedTools { report } = outcome else { panic!("expected a CACHE_TOOLS report") };
        assert_eq!(report.cached, vec![RequestKey::parse("/tools/loan.html").unwrap()]);
        assert_eq!(report.failed.len(), 3);
        assert_eq!(network.calls_to("/x.html"), 0);

        let generation = worker.current_generation();
        assert!(generation.match_key(&RequestKey::parse("/tools/loan.html").unwrap()).await.unwrap().is_some());
        assert!(generation.match_key(&RequestKey::parse("/tools/tax.html").unwrap()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cache_tools_twice_is_once() {
        let network = MockNetwork::new();
        let (worker, _db) = active_worker(network.clone()).await;
        network.respond("/tools/loan.html", 200, "text/html", "loan");
        let tools = vec!["/tools/loan.html".to_string()];

        worker.cache_tools(&tools).await;
        let keys_once = worker.current_generation().keys().await.unwrap();
        worker.cache_tools(&tools).await;
        let keys_twice = worker.current_generation().keys().await.unwrap();

        assert_eq!(keys_once, keys_twice);
        let stored = worker
            .current_generation()
            .match_key(&RequestKey::parse("/tools/loan.html").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.body.as_ref(), b"loan");
    }

    #[tokio::test]
    async fn test_cache_tools_before_install_is_ignored() {
        let network = MockNetwork::new();
        network.respond("/tools/loan.html", 200, "text/html", "loan");
        let (worker, db) = worker("easycal-v2.0", network.clone()).await;

        let report = worker.cache_tools(&["/tools/loan.html".to_string()]).await;
        assert!(report.cached.is_empty());
        assert_eq!(network.calls(), 0);
        assert!(db.list_generations().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_skip_waiting_message() {
        let network = MockNetwork::new();
        crate::testing::serve_manifest(&network);
        let db = easycal_core::CacheDb::open_in_memory().await.unwrap();
        let worker = Worker::new(crate::testing::worker_config("easycal-v2.0", false), db, network);
        worker.install().await.unwrap();
        assert_eq!(worker.state(), WorkerState::Installed);

        let outcome = worker.handle_message(&json!({"type": "SKIP_WAITING"})).await;
        assert_eq!(outcome, MessageOutcome::SkipWaiting { state: WorkerState::Active });
    }

    #[tokio::test]
    async fn test_malformed_messages_are_ignored() {
        let network = MockNetwork::new();
        let (worker, db) = active_worker(network.clone()).await;
        let before = worker.current_generation().keys().await.unwrap();
        let calls = network.calls();

        for payload in [
            json!(null),
            json!("CACHE_TOOLS"),
            json!({}),
            json!({"type": "NOPE"}),
            json!({"type": "CACHE_TOOLS"}),
            json!({"type": "CACHE_TOOLS", "tools": "not-a-list"}),
        ] {
            assert_eq!(worker.handle_message(&payload).await, MessageOutcome::Ignored);
        }

        assert_eq!(worker.current_generation().keys().await.unwrap(), before);
        assert_eq!(network.calls(), calls);
        assert_eq!(db.list_generations().await.unwrap(), vec!["easycal-v2.0".to_string()]);
    }

    #[tokio::test]
    async fn test_sync_broadcasts_to_every_client() {
        let (worker, _db) = active_worker(MockNetwork::new()).await;
        let (_, mut first) = worker.clients().connect("http://localhost:8080/dashboard.html").await;
        let (_, mut second) = worker.clients().connect("http://localhost:8080/").await;

        assert_eq!(worker.handle_sync("check-expiry-daily").await, 2);
        assert!(matches!(first.recv().await, Some(WorkerMessage::CheckExpiry { .. })));
        assert!(matches!(second.recv().await, Some(WorkerMessage::CheckExpiry { .. })));

        assert_eq!(worker.handle_sync("sync-user-data").await, 2);
        assert!(matches!(first.recv().await, Some(WorkerMessage::SyncUserData { .. })));
    }

    #[tokio::test]
    async fn test_unknown_sync_tag() {
        let (worker, _db) = active_worker(MockNetwork::new()).await;
        let (_, mut rx) = worker.clients().connect("http://localhost:8080/").await;

        assert_eq!(worker.handle_sync("refresh-everything").await, 0);
        assert!(rx.try_recv().is_err());
    }
}
