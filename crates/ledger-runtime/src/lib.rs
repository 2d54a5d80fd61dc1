//! Runtime offloading layer for Claude Ledger.
//!
//! The query pipeline itself is synchronous; this crate supplies the
//! caller-side helpers around it: a TTL-based statistics cache and an async
//! periodic refresh service.

pub mod refresh;
pub mod stats_cache;

pub use ledger_core as core;
pub use ledger_data as data;
