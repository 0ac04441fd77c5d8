//! SQLite-backed cache generations for the offline worker.
//!
//! This module provides the persistent cache store the worker serves from,
//! using SQLite with async access via tokio-rusqlite. It supports:
//!
//! - Named, versioned generations that are swept wholesale on deploy
//! - Per-key captured responses with last-write-wins overwrite
//! - All-or-nothing population of a generation at install time
//! - Automatic schema migrations and WAL mode for concurrent access

pub mod connection;
pub mod generations;
pub mod hash;
pub mod key;
pub mod migrations;
pub mod response;

pub use crate::Error;

pub use connection::CacheDb;
pub use generations::{Generation, GenerationInfo, StoredEntry};
pub use key::RequestKey;
pub use response::CapturedResponse;
