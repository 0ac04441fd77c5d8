//! Cache inspection MCP tools.
//!
//! Both tools default to the worker's current generation.

pub mod get;
pub mod purge;

pub use get::{CacheGetParams, get_impl};
pub use purge::{CachePurgeParams, purge_impl};
