//! Data ingestion layer for Claude Ledger.
//!
//! Responsible for discovering, reading, and parsing JSONL usage files
//! produced by Claude Code, aggregating entries into per-model, per-project,
//! and per-period statistics, and exposing the high-level query facade.

pub mod aggregator;
pub mod parser;
pub mod query;

pub use ledger_core as core;
