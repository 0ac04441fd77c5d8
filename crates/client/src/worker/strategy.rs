//! Fetch strategies, one per route class.
//!
//! ### Shared rules
//! - A network *failure* is a transport error. Any HTTP response, whatever
//!   its status, is returned to the page; only 2xx responses are written to
//!   the cache.
//! - Cache reads that fail count as misses, cache writes that fail are
//!   logged and dropped. Neither ever reaches the page.
//! - Every strategy produces a response.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::task::TaskTracker;
use url::Url;

use easycal_core::{CapturedResponse, Generation, RequestKey};

use super::request::FetchRequest;
use super::route::RouteClass;
use crate::fetch::Network;

/// Placeholder served for images that are neither cached nor reachable.
pub const PLACEHOLDER_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100" viewBox="0 0 100 100"><rect width="100" height="100" fill="#f0f0f0"/><text x="50" y="50" font-family="Arial" font-size="12" text-anchor="middle" dominant-baseline="middle" fill="#999">EasyCal</text></svg>"##;

/// Everything a strategy may touch while answering one request.
#[derive(Clone)]
pub struct StrategyContext {
    pub generation: Generation,
    pub network: Arc<dyn Network>,
    pub offline_page: RequestKey,
    pub error_page: RequestKey,
    pub background: TaskTracker,
}

impl StrategyContext {
    /// Cached response for `key`; read errors are treated as a miss.
    pub async fn cached(&self, key: &RequestKey) -> Option<CapturedResponse> {
        match self.generation.match_key(key).await {
            Ok(hit) => {
                if hit.is_some() {
                    tracing::debug!("cache hit {} in {}", key, self.generation.name());
                }
                hit
            }
            Err(e) => {
                tracing::warn!("cache read failed for {}: {}", key, e);
                None
            }
        }
    }

    /// Store a successful response. Non-2xx responses and write errors are
    /// dropped.
    pub async fn store(&self, key: &RequestKey, url: &Url, response: &CapturedResponse) {
        if !response.is_success() {
            tracing::debug!("not caching {} (status {})", key, response.status);
            return;
        }

        if let Err(e) = self.generation.put(key, url.as_str(), response).await {
            tracing::warn!("cache write failed for {}: {}", key, e);
        }
    }

    /// A pre-cached fallback page, or a synthesized network error.
    pub async fn fallback(&self, page: &RequestKey) -> CapturedResponse {
        match self.cached(page).await {
            Some(response) => response,
            None => {
                tracing::warn!("fallback page {} missing from {}", page, self.generation.name());
                CapturedResponse::network_error()
            }
        }
    }

    /// Re-fetch `request` on a detached task and overwrite its entry.
    ///
    /// The outcome only shows up in logs.
    pub fn refresh_in_background(&self, request: &FetchRequest) {
        let ctx = self.clone();
        let url = request.url.clone();
        let key = request.key();

        self.background.spawn(async move {
            match ctx.network.fetch(&url).await {
                Ok(response) => {
                    ctx.store(&key, &url, &response).await;
                    tracing::debug!("refreshed {} ({})", key, response.status);
                }
                Err(e) => tracing::debug!("background refresh of {} failed: {}", key, e),
            }
        });
    }
}

/// Cache/network ordering policy for a route class.
#[async_trait]
pub trait Strategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn respond(&self, ctx: &StrategyContext, request: &FetchRequest) -> CapturedResponse;
}

/// Network, falling back to cache, then to the offline page.
pub struct NetworkFirst;

#[async_trait]
impl Strategy for NetworkFirst {
    fn name(&self) -> &'static str {
        "network_first"
    }

    async fn respond(&self, ctx: &StrategyContext, request: &FetchRequest) -> CapturedResponse {
        let key = request.key();
        match ctx.network.fetch(&request.url).await {
            Ok(response) => {
                ctx.store(&key, &request.url, &response).await;
                response
            }
            Err(e) => {
                tracing::debug!("navigation to {} offline: {}", key, e);
                match ctx.cached(&key).await {
                    Some(response) => response,
                    None => ctx.fallback(&ctx.offline_page).await,
                }
            }
        }
    }
}

/// Cache, then network, then the tool error page.
pub struct CacheFirst;

#[async_trait]
impl Strategy for CacheFirst {
    fn name(&self) -> &'static str {
        "cache_first"
    }

    async fn respond(&self, ctx: &StrategyContext, request: &FetchRequest) -> CapturedResponse {
        let key = request.key();
        if let Some(response) = ctx.cached(&key).await {
            return response;
        }

        match ctx.network.fetch(&request.url).await {
            Ok(response) => {
                ctx.store(&key, &request.url, &response).await;
                response
            }
            Err(e) => {
                tracing::debug!("tool {} unavailable: {}", key, e);
                ctx.fallback(&ctx.error_page).await
            }
        }
    }
}

/// Cache, then network, then an inline SVG.
pub struct CacheFirstWithPlaceholder;

impl CacheFirstWithPlaceholder {
    pub fn placeholder() -> CapturedResponse {
        CapturedResponse::with_content_type(200, "image/svg+xml", PLACEHOLDER_SVG)
    }
}

#[async_trait]
impl Strategy for CacheFirstWithPlaceholder {
    fn name(&self) -> &'static str {
        "cache_first_with_placeholder"
    }

    async fn respond(&self, ctx: &StrategyContext, request: &FetchRequest) -> CapturedResponse {
        let key = request.key();
        if let Some(response) = ctx.cached(&key).await {
            return response;
        }

        match ctx.network.fetch(&request.url).await {
            Ok(response) => {
                ctx.store(&key, &request.url, &response).await;
                response
            }
            Err(e) => {
                tracing::debug!("image {} unavailable, serving placeholder: {}", key, e);
                Self::placeholder()
            }
        }
    }
}

/// Serve the cached copy now and refresh it behind the page's back.
pub struct StaleWhileRevalidate;

#[async_trait]
impl Strategy for StaleWhileRevalidate {
    fn name(&self) -> &'static str {
        "stale_while_revalidate"
    }

    async fn respond(&self, ctx: &StrategyContext, request: &FetchRequest) -> CapturedResponse {
        let key = request.key();
        if let Some(response) = ctx.cached(&key).await {
            ctx.refresh_in_background(request);
            return response;
        }

        match ctx.network.fetch(&request.url).await {
            Ok(response) => {
                ctx.store(&key, &request.url, &response).await;
                response
            }
            Err(e) => {
                tracing::debug!("asset {} unavailable: {}", key, e);
                CapturedResponse::empty(404)
            }
        }
    }
}

/// Network as-is, cache only when offline. Never writes.
pub struct NetworkWithCacheFallback;

#[async_trait]
impl Strategy for NetworkWithCacheFallback {
    fn name(&self) -> &'static str {
        "network_with_cache_fallback"
    }

    async fn respond(&self, ctx: &StrategyContext, request: &FetchRequest) -> CapturedResponse {
        match ctx.network.fetch(&request.url).await {
            Ok(response) => response,
            Err(e) => {
                let key = request.key();
                tracing::debug!("{} offline: {}", key, e);
                ctx.cached(&key).await.unwrap_or_else(CapturedResponse::network_error)
            }
        }
    }
}

/// Route class to strategy lookup.
#[derive(Clone)]
pub struct StrategyTable {
    strategies: HashMap<RouteClass, Arc<dyn Strategy>>,
}

impl Default for StrategyTable {
    fn default() -> Self {
        let mut strategies: HashMap<RouteClass, Arc<dyn Strategy>> = HashMap::new();
        strategies.insert(RouteClass::Navigation, Arc::new(NetworkFirst));
        strategies.insert(RouteClass::Tool, Arc::new(CacheFirst));
        strategies.insert(RouteClass::Image, Arc::new(CacheFirstWithPlaceholder));
        strategies.insert(RouteClass::Asset, Arc::new(StaleWhileRevalidate));
        strategies.insert(RouteClass::Default, Arc::new(NetworkWithCacheFallback));
        Self { strategies }
    }
}

impl StrategyTable {
    /// Replace the strategy for one route class.
    pub fn set(&mut self, class: RouteClass, strategy: Arc<dyn Strategy>) {
        self.strategies.insert(class, strategy);
    }

    pub fn get(&self, class: RouteClass) -> Arc<dyn Strategy> {
        self.strategies
            .get(&class)
            .cloned()
            .unwrap_or_else(|| Arc::new(NetworkWithCacheFallback))
    }
}
