use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the Claude Ledger pipeline.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// The requested log file does not exist.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// A file exists but could not be read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file was read but its bytes are not valid UTF-8.
    #[error("File is not valid UTF-8: {0}")]
    InvalidData(PathBuf),

    /// A log line could not be parsed as JSON under the strict policy.
    #[error("Malformed JSON on line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Discovery and parsing succeeded but produced no usage entries.
    #[error("No usage data found")]
    NoUsageData,
}

/// Convenience alias used throughout the ledger crates.
pub type Result<T> = std::result::Result<T, LedgerError>;
