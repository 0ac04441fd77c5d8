//! Client side of the EasyCal cache worker.
//!
//! This crate provides the origin-bound fetch client, the request
//! interception pipeline (route classification and fetch strategies), the
//! install/activate lifecycle, and the page messaging channel.

pub mod fetch;
pub mod worker;

#[cfg(test)]
mod testing;

pub use fetch::{FetchClient, FetchConfig, Network};

pub use worker::{
    CacheToolsReport, Client, Clients, Destination, FetchRequest, Interception, MessageOutcome, RequestMode,
    RouteClass, Strategy, StrategyContext, StrategyTable, Worker, WorkerState, classify,
};
