//! Immutable settings handed to the worker at construction.

use url::Url;

use super::{AppConfig, ConfigError};
use crate::cache::RequestKey;
use crate::cache::hash::manifest_digest;

/// What the route classifier needs to know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteConfig {
    pub origin: Url,
    pub tools_prefix: String,
    pub asset_extensions: Vec<String>,
}

/// Resolved worker configuration.
///
/// Every path in here is already normalised to a `RequestKey`, so nothing
/// downstream has to deal with relative manifest entries.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub version: String,
    pub routes: RouteConfig,
    pub manifest: Vec<RequestKey>,
    pub offline_page: RequestKey,
    pub error_page: RequestKey,
    pub skip_waiting_on_install: bool,
}

impl WorkerConfig {
    pub fn origin(&self) -> &Url {
        &self.routes.origin
    }

    /// Digest identifying the manifest contents for this version.
    pub fn manifest_digest(&self) -> String {
        manifest_digest(&self.manifest)
    }
}

impl AppConfig {
    /// Derive the immutable worker configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the origin or any manifest entry
    /// cannot be resolved on the origin, and `ConfigError::Missing` if a
    /// fallback page does not resolve to a manifest key.
    pub fn worker_config(&self) -> Result<WorkerConfig, ConfigError> {
        let origin = Url::parse(&self.origin).map_err(|e| ConfigError::Invalid {
            field: "origin".into(),
            reason: e.to_string(),
        })?;

        let resolve = |field: &str, entry: &str| {
            RequestKey::resolve(&origin, entry)
                .map(|(_, key)| key)
                .map_err(|e| ConfigError::Invalid { field: field.into(), reason: e.to_string() })
        };

        let mut manifest = Vec::with_capacity(self.manifest.len());
        for entry in &self.manifest {
            let key = resolve("manifest", entry)?;
            if !manifest.contains(&key) {
                manifest.push(key);
            }
        }

        let offline_page = resolve("offline_page", &self.offline_page)?;
        let error_page = resolve("error_page", &self.error_page)?;

        for (field, page) in [("offline_page", &offline_page), ("error_page", &error_page)] {
            if !manifest.contains(page) {
                return Err(ConfigError::Missing {
                    field: field.into(),
                    hint: format!("{page} must be listed in the manifest"),
                });
            }
        }

        Ok(WorkerConfig {
            version: self.cache_version.clone(),
            routes: RouteConfig {
                origin: origin.clone(),
                tools_prefix: self.tools_prefix.clone(),
                asset_extensions: self.asset_extensions.clone(),
            },
            manifest,
            offline_page,
            error_page,
            skip_waiting_on_install: self.skip_waiting_on_install,
        })
    }
}
