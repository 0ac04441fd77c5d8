//! Install and activate lifecycle.
//!
//! ```text
//! Parsed -> Installing -> Installed -> Activating -> Active
//!               |                         |
//!               v                         v (sweep failed)
//!           Redundant                 Installed
//! ```
//!
//! A failed install leaves the store exactly as it was. The current state
//! lives in a `watch` channel so fetch handling can wait out activation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::future::try_join_all;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use easycal_core::{CacheDb, CapturedResponse, Error, RequestKey, WorkerConfig};

use super::clients::Clients;
use crate::fetch::Network;

/// Lifecycle state of the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    /// Constructed, nothing attempted yet.
    Parsed,
    Installing,
    /// Generation populated, waiting to take over.
    Installed,
    Activating,
    /// Serving requests from the current generation.
    Active,
    /// Install failed; this attempt is discarded.
    Redundant,
}

impl WorkerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerState::Parsed => "parsed",
            WorkerState::Installing => "installing",
            WorkerState::Installed => "installed",
            WorkerState::Activating => "activating",
            WorkerState::Active => "active",
            WorkerState::Redundant => "redundant",
        }
    }
}

fn is_valid_transition(from: WorkerState, to: WorkerState) -> bool {
    use WorkerState::*;
    matches!(
        (from, to),
        (Parsed, Installing)
            | (Redundant, Installing)
            | (Installing, Installed)
            | (Installing, Redundant)
            | (Parsed, Installed)
            | (Installed, Activating)
            | (Activating, Active)
            | (Activating, Installed)
    )
}

/// Drives install and activation for one cache version.
pub struct LifecycleManager {
    config: Arc<WorkerConfig>,
    db: CacheDb,
    network: Arc<dyn Network>,
    clients: Clients,
    state: watch::Sender<WorkerState>,
    skip_requested: AtomicBool,
}

impl LifecycleManager {
    pub fn new(config: Arc<WorkerConfig>, db: CacheDb, network: Arc<dyn Network>, clients: Clients) -> Self {
        let (state, _) = watch::channel(WorkerState::Parsed);
        Self { config, db, network, clients, state, skip_requested: AtomicBool::new(false) }
    }

    pub fn state(&self) -> WorkerState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<WorkerState> {
        self.state.subscribe()
    }

    /// Move to `to`, returning the previous state.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidState` if the move is not allowed from the
    /// current state. The check and the move happen atomically.
    pub(crate) fn transition(&self, to: WorkerState) -> Result<WorkerState, Error> {
        let mut from = None;
        let mut current = WorkerState::Parsed;
        self.state.send_if_modified(|state| {
            current = *state;
            if is_valid_transition(*state, to) {
                from = Some(*state);
                *state = to;
                true
            } else {
                false
            }
        });

        match from {
            Some(from) => {
                tracing::info!("worker {}: {} -> {}", self.config.version, from.as_str(), to.as_str());
                Ok(from)
            }
            None => Err(Error::InvalidState(format!("cannot go from {} to {}", current.as_str(), to.as_str()))),
        }
    }

    /// Host start-up hook.
    ///
    /// Resumes straight into activation when the current generation is
    /// already complete in the store, otherwise installs first.
    pub async fn register(&self) -> Result<WorkerState, Error> {
        if self.state() != WorkerState::Parsed {
            return Ok(self.state());
        }

        if self.generation_complete().await? {
            tracing::info!("generation {} already installed, resuming", self.config.version);
            self.transition(WorkerState::Installed)?;
            self.activate().await
        } else {
            self.install().await
        }
    }

    async fn generation_complete(&self) -> Result<bool, Error> {
        if !self.db.generation_exists(&self.config.version).await? {
            return Ok(false);
        }
        let stored = self.db.generation(&self.config.version).keys().await?;
        Ok(self.config.manifest.iter().all(|key| stored.contains(key)))
    }

    /// Fetch the whole manifest and store it as the current generation.
    ///
    /// # Errors
    ///
    /// Returns `Error::InstallFailed` if any entry could not be fetched or
    /// came back with a non-2xx status. The worker is then `Redundant` and
    /// nothing was written.
    pub async fn install(&self) -> Result<WorkerState, Error> {
        self.transition(WorkerState::Installing)?;
        let version = &self.config.version;

        let entries = match try_join_all(self.config.manifest.iter().map(|key| self.fetch_entry(key))).await {
            Ok(entries) => entries,
            Err(e) => return Err(self.fail_install(e)),
        };

        let digest = self.config.manifest_digest();
        match self.db.manifest_digest(version).await {
            Ok(Some(stored)) if stored != digest => {
                tracing::warn!("manifest for {} changed without a version bump", version);
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("could not read manifest digest for {}: {}", version, e),
        }

        let count = entries.len();
        if let Err(e) = self.db.install_generation(version, &digest, entries).await {
            return Err(self.fail_install(e));
        }

        self.transition(WorkerState::Installed)?;
        tracing::info!("installed {} with {} entries", version, count);

        if self.config.skip_waiting_on_install || self.skip_requested.swap(false, Ordering::SeqCst) {
            return self.activate().await;
        }
        Ok(WorkerState::Installed)
    }

    async fn fetch_entry(&self, key: &RequestKey) -> Result<(RequestKey, String, CapturedResponse), Error> {
        let url = key.url_on(self.config.origin())?;
        let response = self
            .network
            .fetch(&url)
            .await
            .map_err(|e| Error::InstallFailed(format!("{key}: {e}")))?;

        if !response.is_success() {
            return Err(Error::HttpError(format!("{key}: {}", response.status)));
        }
        Ok((key.clone(), url.to_string(), response))
    }

    fn fail_install(&self, err: Error) -> Error {
        tracing::error!("install of {} failed: {}", self.config.version, err);
        if let Err(e) = self.transition(WorkerState::Redundant) {
            tracing::warn!("{}", e);
        }
        if matches!(err, Error::InstallFailed(_)) { err } else { Error::InstallFailed(err.to_string()) }
    }

    /// Activate as soon as possible.
    ///
    /// Activates now when installed; while installing, activation follows
    /// the install. Otherwise a no-op.
    ///
    /// The request is a flag taken by whichever of `install` and this call
    /// sees `Installed` first, so it is acted on exactly once.
    pub async fn skip_waiting(&self) -> Result<WorkerState, Error> {
        if matches!(self.state(), WorkerState::Activating | WorkerState::Active) {
            return Ok(self.state());
        }

        self.skip_requested.store(true, Ordering::SeqCst);
        if self.state() == WorkerState::Installed && self.skip_requested.swap(false, Ordering::SeqCst) {
            return self.activate().await;
        }
        Ok(self.state())
    }

    /// Make the current generation the only one and take control of pages.
    ///
    /// Idempotent once active.
    pub async fn activate(&self) -> Result<WorkerState, Error> {
        if self.state() == WorkerState::Active {
            return Ok(WorkerState::Active);
        }
        self.transition(WorkerState::Activating)?;

        if let Err(e) = self.sweep().await {
            tracing::error!("activation of {} failed: {}", self.config.version, e);
            self.transition(WorkerState::Installed)?;
            return Err(e);
        }

        let claimed = self.clients.claim(&self.config.version).await;
        tracing::info!("{} claimed {} clients", self.config.version, claimed);

        self.transition(WorkerState::Active)?;
        Ok(WorkerState::Active)
    }

    /// Delete every generation except the current one.
    async fn sweep(&self) -> Result<(), Error> {
        for name in self.db.list_generations().await? {
            if name != self.config.version {
                self.db.delete_generation(&name).await?;
                tracing::info!("deleted stale generation {}", name);
            }
        }
        Ok(())
    }

    /// Wait until the worker is not activating.
    ///
    /// Returns whether it is active, i.e. whether fetches should be
    /// intercepted.
    pub async fn ready(&self) -> bool {
        let mut rx = self.state.subscribe();
        rx.wait_for(|state| *state != WorkerState::Activating)
            .await
            .map(|state| *state == WorkerState::Active)
            .unwrap_or(false)
    }
}
