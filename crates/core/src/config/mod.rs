//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (EASYCAL_*)
//! 2. TOML config file (if EASYCAL_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;
mod worker;

pub use validation::ConfigError;
pub use worker::{RouteConfig, WorkerConfig};

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (EASYCAL_*)
/// 2. TOML config file (if EASYCAL_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Origin the worker serves; requests elsewhere bypass it.
    ///
    /// Set via EASYCAL_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Cache version identifier. Bump it whenever the manifest changes.
    ///
    /// Set via EASYCAL_CACHE_VERSION environment variable.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// Path to SQLite cache database.
    ///
    /// Set via EASYCAL_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via EASYCAL_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per request.
    ///
    /// Set via EASYCAL_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via EASYCAL_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Path fragment that marks a request as a tool page.
    #[serde(default = "default_tools_prefix")]
    pub tools_prefix: String,

    /// Path suffixes served with the background-refresh strategy.
    #[serde(default = "default_asset_extensions")]
    pub asset_extensions: Vec<String>,

    /// Page served to navigations when offline and uncached.
    #[serde(default = "default_offline_page")]
    pub offline_page: String,

    /// Page served for tools that cannot be loaded.
    #[serde(default = "default_error_page")]
    pub error_page: String,

    /// Assets cached at install time.
    #[serde(default = "default_manifest")]
    pub manifest: Vec<String>,

    /// Activate as soon as install completes instead of waiting.
    ///
    /// Set via EASYCAL_SKIP_WAITING_ON_INSTALL environment variable.
    #[serde(default = "default_true")]
    pub skip_waiting_on_install: bool,
}

fn default_origin() -> String {
    "http://localhost:8080/".into()
}

fn default_cache_version() -> String {
    "easycal-v2.0".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./easycal-cache.sqlite")
}

fn default_user_agent() -> String {
    "easycal-sw/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_tools_prefix() -> String {
    "/tools/".into()
}

fn default_asset_extensions() -> Vec<String> {
    vec![".css".into(), ".js".into()]
}

fn default_offline_page() -> String {
    "/offline.html".into()
}

fn default_error_page() -> String {
    "/tools/error.html".into()
}

fn default_manifest() -> Vec<String> {
    [
        // shell pages
        "/",
        "/index.html",
        "/dashboard.html",
        "/admin.html",
        "/payment.html",
        "/welcome.html",
        // stylesheets
        "/css/style.css",
        "/css/login.css",
        "/css/dashboard.css",
        "/css/admin.css",
        "/css/payment.css",
        // scripts
        "/js/auth.js",
        "/js/dashboard.js",
        "/js/admin.js",
        "/js/payment.js",
        // images
        "/assets/images/logo.png",
        "/assets/images/qr-code.png",
        // tools
        "/tools/construction/concrete-bricks.html",
        "/tools/construction/flooring.html",
        "/tools/construction/paint-estimate.html",
        "/tools/timber/sawn-timber.html",
        "/tools/timber/non-sawn.html",
        "/tools/engineering/blank-tools.html",
        "/tools/engineering/soot-mm-inches-converter.html",
        "/tools/sawmills/blank-tools.html",
        "/tools/thai-glass/blank-tools.html",
        // fallbacks
        "/offline.html",
        "/tools/error.html",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            cache_version: default_cache_version(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
            tools_prefix: default_tools_prefix(),
            asset_extensions: default_asset_extensions(),
            offline_page: default_offline_page(),
            error_page: default_error_page(),
            manifest: default_manifest(),
            skip_waiting_on_install: true,
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `EASYCAL_`
    /// 2. TOML file from `EASYCAL_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("EASYCAL_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("EASYCAL_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        Self::from_figment(&figment)
    }

    /// Extract and validate configuration from a prepared figment.
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.origin, "http://localhost:8080/");
        assert_eq!(config.cache_version, "easycal-v2.0");
        assert_eq!(config.db_path, PathBuf::from("./easycal-cache.sqlite"));
        assert_eq!(config.user_agent, "easycal-sw/0.1");
        assert_eq!(config.max_bytes, 5_242_880);
        assert_eq!(config.timeout_ms, 20_000);
        assert_eq!(config.tools_prefix, "/tools/");
        assert_eq!(config.asset_extensions, vec![".css".to_string(), ".js".to_string()]);
        assert!(config.skip_waiting_on_install);
    }

    #[test]
    fn test_default_manifest_contains_fallbacks() {
        let config = AppConfig::default();
        assert!(config.manifest.contains(&config.offline_page));
        assert!(config.manifest.contains(&config.error_page));
        assert_eq!(config.manifest.first().map(String::as_str), Some("/"));
    }

    #[test]
    fn test_timeout_duration() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(20_000));
    }

    #[test]
    fn test_toml_layer_overrides_defaults() {
        let figment = Figment::from(Serialized::defaults(AppConfig::default())).merge(Toml::string(
            r#"
            origin = "https://easycal.example/"
            cache_version = "easycal-v2.1"
            manifest = ["/index.html", "/offline.html", "/tools/error.html"]
            "#,
        ));

        let config = AppConfig::from_figment(&figment).unwrap();
        assert_eq!(config.origin, "https://easycal.example/");
        assert_eq!(config.cache_version, "easycal-v2.1");
        assert_eq!(config.manifest.len(), 3);
        assert_eq!(config.tools_prefix, "/tools/");
    }

    #[test]
    fn test_invalid_layer_is_rejected() {
        let figment =
            Figment::from(Serialized::defaults(AppConfig::default())).merge(Toml::string(r#"cache_version = """#));
        let result = AppConfig::from_figment(&figment);
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "cache_version"));
    }
}
