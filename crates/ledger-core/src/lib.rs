//! Core domain layer for Claude Ledger.
//!
//! Defines the normalised usage-entry model, the pricing engine with its
//! override layers, the error taxonomy shared by all ledger crates, and the
//! timestamp, formatting, and CLI-settings helpers built on top of them.

pub mod error;
pub mod formatting;
pub mod models;
pub mod pricing;
pub mod settings;
pub mod time_utils;
