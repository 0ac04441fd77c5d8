//! Core types and shared functionality for the EasyCal cache worker.
//!
//! This crate provides:
//! - Cache generations with a SQLite backend
//! - Unified error types
//! - Configuration structures
//! - Page/worker message payloads

pub mod cache;
pub mod config;
pub mod error;
pub mod message;

pub use cache::{CacheDb, CapturedResponse, Generation, RequestKey};
pub use config::{AppConfig, ConfigError, RouteConfig, WorkerConfig};
pub use error::Error;
pub use message::{BackgroundTrigger, PageMessage, WorkerMessage};
