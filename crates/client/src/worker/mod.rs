//! The cache worker.
//!
//! `Worker` owns one cache version: its lifecycle, the strategy table used
//! to answer intercepted requests, and the registry of connected pages.
//!
//! ### Interception
//! 1. Classify the request; unclassified requests pass through.
//! 2. Wait out activation; anything arriving before the worker is active
//!    passes through.
//! 3. Run the strategy for the route class against the current generation.

pub mod clients;
pub mod lifecycle;
pub mod messaging;
pub mod request;
pub mod route;
pub mod strategy;

use std::sync::Arc;

use tokio_util::task::TaskTracker;

use easycal_core::{CacheDb, CapturedResponse, Error, Generation, WorkerConfig};

pub use clients::{Client, Clients};
pub use lifecycle::{LifecycleManager, WorkerState};
pub use messaging::{CacheToolsReport, MessageOutcome};
pub use request::{Destination, FetchRequest, RequestMode};
pub use route::{RouteClass, classify};
pub use strategy::{Strategy, StrategyContext, StrategyTable};

use crate::fetch::Network;

/// What the worker did with a request.
#[derive(Debug, Clone)]
pub enum Interception {
    /// Not handled; the host sends the request to the network itself.
    Passthrough,
    /// Answered by the strategy for `route`.
    Respond { route: RouteClass, strategy: &'static str, response: CapturedResponse },
}

pub struct Worker {
    config: Arc<WorkerConfig>,
    db: CacheDb,
    network: Arc<dyn Network>,
    strategies: StrategyTable,
    lifecycle: LifecycleManager,
    clients: Clients,
    context: StrategyContext,
}

impl Worker {
    pub fn new(config: WorkerConfig, db: CacheDb, network: Arc<dyn Network>) -> Self {
        let config = Arc::new(config);
        let clients = Clients::new();
        let lifecycle = LifecycleManager::new(config.clone(), db.clone(), network.clone(), clients.clone());
        let context = StrategyContext {
            generation: db.generation(&config.version),
            network: network.clone(),
            offline_page: config.offline_page.clone(),
            error_page: config.error_page.clone(),
            background: TaskTracker::new(),
        };

        Self { config, db, network, strategies: StrategyTable::default(), lifecycle, clients, context }
    }

    /// Replace the default strategy table.
    pub fn with_strategies(mut self, strategies: StrategyTable) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn db(&self) -> &CacheDb {
        &self.db
    }

    pub fn network(&self) -> &Arc<dyn Network> {
        &self.network
    }

    pub fn clients(&self) -> &Clients {
        &self.clients
    }

    pub fn lifecycle(&self) -> &LifecycleManager {
        &self.lifecycle
    }

    pub fn state(&self) -> WorkerState {
        self.lifecycle.state()
    }

    /// Handle to the generation for this worker's version.
    pub fn current_generation(&self) -> Generation {
        self.context.generation.clone()
    }

    pub async fn register(&self) -> Result<WorkerState, Error> {
        self.lifecycle.register().await
    }

    pub async fn install(&self) -> Result<WorkerState, Error> {
        self.lifecycle.install().await
    }

    pub async fn activate(&self) -> Result<WorkerState, Error> {
        self.lifecycle.activate().await
    }

    pub async fn skip_waiting(&self) -> Result<WorkerState, Error> {
        self.lifecycle.skip_waiting().await
    }

    /// Request-interception hook.
    pub async fn handle_fetch(&self, request: &FetchRequest) -> Interception {
        let Some(route) = classify(request, &self.config.routes) else {
            return Interception::Passthrough;
        };

        if !self.lifecycle.ready().await {
            tracing::debug!("{} arrived while {}, passing through", request.url, self.state().as_str());
            return Interception::Passthrough;
        }

        let strategy = self.strategies.get(route);
        let response = strategy.respond(&self.context, request).await;
        tracing::debug!("{} {} via {} -> {}", route.as_str(), request.key(), strategy.name(), response.status);

        Interception::Respond { route, strategy: strategy.name(), response }
    }

    /// Wait for every background refresh spawned so far.
    pub async fn wait_for_background(&self) {
        let tracker = &self.context.background;
        tracker.close();
        tracker.wait().await;
        tracker.reopen();
    }
}
