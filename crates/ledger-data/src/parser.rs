//! JSONL log parsing and file discovery for Claude Ledger.
//!
//! Turns usage records written by Claude Code into [`UsageEntry`] values,
//! recording a per-line diagnostic for every dropped line, and locates the
//! `.jsonl` files that contain them.

use std::path::{Path, PathBuf};

use ledger_core::error::{LedgerError, Result};
use ledger_core::models::{UsageCounts, UsageEntry};
use serde::Deserialize;
use tracing::{debug, warn};

// ── Policies and diagnostics ──────────────────────────────────────────────────

/// How the parser reacts to a line that is not syntactically valid JSON.
///
/// Schema-level problems (valid JSON that lacks the required fields) are
/// skipped with a diagnostic under both policies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParsePolicy {
    /// Record a diagnostic for the bad line and keep going.
    #[default]
    Lenient,
    /// Fail the whole batch on the first syntactically invalid line.
    Strict,
}

/// Why a line produced no entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// The line is not syntactically valid JSON.
    InvalidJson,
    /// Valid JSON whose fields do not fit the record shape, e.g. a usage
    /// value that is not an object.
    MalformedRecord,
    /// No model identifier at the top level or under `message`.
    MissingModel,
    /// No usage object at the top level or under `message`.
    MissingUsage,
    /// No timestamp.
    MissingTimestamp,
    /// No project path or working directory.
    MissingProjectPath,
}

/// One skipped line: its 1-based number within the parsed content and the
/// reason it was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineDiagnostic {
    pub line: usize,
    pub reason: DropReason,
}

/// Accepted entries plus the diagnostics recorded alongside them.
///
/// For directory loads the diagnostics of all files are concatenated in
/// discovery order; line numbers stay relative to each source file.
#[derive(Debug, Default)]
pub struct ParseOutcome {
    pub entries: Vec<UsageEntry>,
    pub diagnostics: Vec<LineDiagnostic>,
}

// ── Raw line envelope ─────────────────────────────────────────────────────────

/// Loosely-typed envelope capturing every legal location of each field.
/// Resolution picks top-level over nested.
#[derive(Debug, Default, Deserialize)]
struct RawRecord {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    usage: Option<UsageCounts>,
    #[serde(default)]
    message: Option<RawMessage>,
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default, alias = "cwd")]
    project_path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawMessage {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    usage: Option<UsageCounts>,
}

/// Resolve a decoded envelope into an entry, or name the first missing field.
fn resolve(record: RawRecord) -> std::result::Result<UsageEntry, DropReason> {
    let message = record.message.unwrap_or_default();

    let model = record
        .model
        .or(message.model)
        .filter(|m| !m.is_empty())
        .ok_or(DropReason::MissingModel)?;
    let counts = record
        .usage
        .or(message.usage)
        .ok_or(DropReason::MissingUsage)?;
    let timestamp = record
        .timestamp
        .filter(|t| !t.is_empty())
        .ok_or(DropReason::MissingTimestamp)?;
    let project_path = record
        .project_path
        .filter(|p| !p.is_empty())
        .ok_or(DropReason::MissingProjectPath)?;

    Ok(UsageEntry {
        model,
        counts,
        timestamp,
        project_path,
    })
}

// ── LogRecordParser ───────────────────────────────────────────────────────────

/// Parses JSON Lines content into usage entries and discovers log files.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogRecordParser {
    policy: ParsePolicy,
}

impl LogRecordParser {
    /// Create a parser with the given line-failure policy.
    pub fn new(policy: ParsePolicy) -> Self {
        Self { policy }
    }

    /// The configured line-failure policy.
    pub fn policy(&self) -> ParsePolicy {
        self.policy
    }

    /// Parse JSON Lines content into entries plus per-line diagnostics.
    ///
    /// Blank and whitespace-only lines are skipped without a diagnostic.
    /// Entries preserve input line order. Under [`ParsePolicy::Strict`] the
    /// first syntactically invalid line fails the whole batch.
    pub fn parse(&self, content: &str) -> Result<ParseOutcome> {
        let mut outcome = ParseOutcome::default();

        for (idx, line) in content.lines().enumerate() {
            let line_no = idx + 1;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            // Step 1: syntax. Only this step can fail the batch.
            let value: serde_json::Value = match serde_json::from_str(trimmed) {
                Ok(v) => v,
                Err(e) => {
                    if self.policy == ParsePolicy::Strict {
                        return Err(LedgerError::Parse {
                            line: line_no,
                            message: e.to_string(),
                        });
                    }
                    debug!("skipping invalid JSON on line {}: {}", line_no, e);
                    outcome.diagnostics.push(LineDiagnostic {
                        line: line_no,
                        reason: DropReason::InvalidJson,
                    });
                    continue;
                }
            };

            // Step 2: shape. Failures here never abort the batch.
            let record: RawRecord = match serde_json::from_value(value) {
                Ok(r) => r,
                Err(e) => {
                    debug!("line {} does not fit the record shape: {}", line_no, e);
                    outcome.diagnostics.push(LineDiagnostic {
                        line: line_no,
                        reason: DropReason::MalformedRecord,
                    });
                    continue;
                }
            };

            match resolve(record) {
                Ok(entry) => outcome.entries.push(entry),
                Err(reason) => outcome.diagnostics.push(LineDiagnostic {
                    line: line_no,
                    reason,
                }),
            }
        }

        Ok(outcome)
    }

    /// Find all `.jsonl` files recursively under `root`, sorted by path.
    pub fn find_log_files(&self, root: &Path) -> Vec<PathBuf> {
        if !root.exists() {
            warn!("Data path does not exist: {}", root.display());
            return Vec::new();
        }

        let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
            .follow_links(true)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                entry.file_type().is_file()
                    && entry
                        .path()
                        .extension()
                        .map(|ext| ext == "jsonl")
                        .unwrap_or(false)
            })
            .map(|entry| entry.into_path())
            .collect();

        files.sort();
        files
    }

    /// Read one log file and parse its content.
    pub fn load_file(&self, path: &Path) -> Result<ParseOutcome> {
        let bytes = std::fs::read(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                LedgerError::FileNotFound(path.to_path_buf())
            } else {
                LedgerError::FileRead {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;
        let content =
            String::from_utf8(bytes).map_err(|_| LedgerError::InvalidData(path.to_path_buf()))?;
        self.parse(&content)
    }

    /// Discover and load every log file under `root`, concatenating entries
    /// and diagnostics in discovery order.
    ///
    /// A file that cannot be read is logged and skipped; a strict-mode parse
    /// failure aborts the load.
    pub fn load_directory(&self, root: &Path) -> Result<ParseOutcome> {
        let files = self.find_log_files(root);
        let mut combined = ParseOutcome::default();

        for file in &files {
            match self.load_file(file) {
                Ok(mut outcome) => {
                    debug!(
                        "{}: {} entries, {} skipped lines",
                        file.display(),
                        outcome.entries.len(),
                        outcome.diagnostics.len()
                    );
                    combined.entries.append(&mut outcome.entries);
                    combined.diagnostics.append(&mut outcome.diagnostics);
                }
                Err(err @ LedgerError::Parse { .. }) => return Err(err),
                Err(err) => warn!("Skipping {}: {}", file.display(), err),
            }
        }

        Ok(combined)
    }
}

// ── Entry filters ─────────────────────────────────────────────────────────────

/// Pure filtering helpers over parsed entries.
///
/// All of them preserve the relative order of the input and return owned
/// copies, leaving the source slice untouched.
pub mod filters {
    use ledger_core::models::UsageEntry;
    use ledger_core::time_utils::month_prefix;

    /// Entries whose project path matches exactly.
    pub fn by_project(entries: &[UsageEntry], project_path: &str) -> Vec<UsageEntry> {
        entries
            .iter()
            .filter(|e| e.project_path == project_path)
            .cloned()
            .collect()
    }

    /// Entries whose model identifier matches exactly.
    pub fn by_model(entries: &[UsageEntry], model: &str) -> Vec<UsageEntry> {
        entries
            .iter()
            .filter(|e| e.model == model)
            .cloned()
            .collect()
    }

    /// Entries whose timestamp falls in the given `"YYYY-MM"` month.
    pub fn by_month(entries: &[UsageEntry], month: &str) -> Vec<UsageEntry> {
        entries
            .iter()
            .filter(|e| month_prefix(&e.timestamp) == month)
            .cloned()
            .collect()
    }

    /// Entries whose timestamp lies in the inclusive `[start, end]` range.
    ///
    /// Plain string comparison is valid because the timestamps share the
    /// fixed-width, zero-padded ISO-8601 UTC format.
    pub fn by_date_range(entries: &[UsageEntry], start: &str, end: &str) -> Vec<UsageEntry> {
        entries
            .iter()
            .filter(|e| e.timestamp.as_str() >= start && e.timestamp.as_str() <= end)
            .cloned()
            .collect()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
