use clap::Parser;
use std::path::PathBuf;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Token usage and cost reporting for Claude Code logs
#[derive(Parser, Debug, Clone)]
#[command(
    name = "claude-ledger",
    about = "Token usage and cost reporting for Claude Code logs",
    version
)]
pub struct Settings {
    /// Root directory containing JSONL usage logs (auto-discovered when omitted)
    #[arg(long)]
    pub data_path: Option<PathBuf>,

    /// Report view
    #[arg(long, default_value = "summary", value_parser = ["summary", "daily", "monthly", "hourly", "models", "projects"])]
    pub view: String,

    /// Restrict the report to one month (YYYY-MM)
    #[arg(long)]
    pub month: Option<String>,

    /// Restrict the report to one project path
    #[arg(long)]
    pub project: Option<String>,

    /// Restrict the report to one model identifier
    #[arg(long)]
    pub model: Option<String>,

    /// Inclusive lower timestamp bound (ISO-8601 UTC)
    #[arg(long)]
    pub since: Option<String>,

    /// Inclusive upper timestamp bound (ISO-8601 UTC)
    #[arg(long)]
    pub until: Option<String>,

    /// Number of rows shown in the models / projects ranking views (1-100)
    #[arg(long, default_value = "10", value_parser = clap::value_parser!(u32).range(1..=100))]
    pub top: u32,

    /// Fail on the first malformed log line instead of skipping it
    #[arg(long)]
    pub strict: bool,

    /// Keep running and re-render the report periodically
    #[arg(long)]
    pub watch: bool,

    /// Watch refresh interval in seconds (1-3600)
    #[arg(long, default_value = "60", value_parser = clap::value_parser!(u32).range(1..=3600))]
    pub refresh_rate: u32,

    /// Timezone for daily and hourly buckets (auto-detected if not specified)
    #[arg(long, default_value = "auto")]
    pub timezone: String,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

impl Settings {
    /// The configured log level, with `--debug` taking precedence.
    pub fn effective_log_level(&self) -> &str {
        if self.debug {
            "DEBUG"
        } else {
            &self.log_level
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
