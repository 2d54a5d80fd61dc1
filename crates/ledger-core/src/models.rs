use serde::{Deserialize, Serialize};

/// Token counts reported for a single API call.
///
/// Every field is optional on the wire; an absent count means the API did
/// not report that category and is treated as zero in all arithmetic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageCounts {
    /// Input (prompt) tokens consumed.
    #[serde(default)]
    pub input_tokens: Option<u64>,
    /// Output (completion) tokens generated.
    #[serde(default)]
    pub output_tokens: Option<u64>,
    /// Tokens written into the prompt cache.
    #[serde(default, rename = "cache_creation_input_tokens", alias = "cache_creation_tokens")]
    pub cache_creation_tokens: Option<u64>,
    /// Tokens read from the prompt cache.
    #[serde(default, rename = "cache_read_input_tokens", alias = "cache_read_tokens")]
    pub cache_read_tokens: Option<u64>,
}

impl UsageCounts {
    /// Sum of all four token categories, counting absent fields as zero.
    pub fn total_tokens(&self) -> u64 {
        self.input_tokens.unwrap_or(0)
            + self.output_tokens.unwrap_or(0)
            + self.cache_creation_tokens.unwrap_or(0)
            + self.cache_read_tokens.unwrap_or(0)
    }

    /// True when no token category was reported at all.
    pub fn is_empty(&self) -> bool {
        self.input_tokens.is_none()
            && self.output_tokens.is_none()
            && self.cache_creation_tokens.is_none()
            && self.cache_read_tokens.is_none()
    }
}

/// A single normalised API call record extracted from a JSONL usage log.
///
/// Instances are produced only by the log parser; the timestamp keeps its
/// original ISO-8601 UTC string form so ordering and range filters can use
/// plain lexicographic comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageEntry {
    /// Raw model identifier string from the record.
    pub model: String,
    /// Token counts for this call; may be entirely empty, never absent.
    pub counts: UsageCounts,
    /// ISO-8601 UTC timestamp string (`YYYY-MM-DDTHH:MM:SS[.fff]Z`).
    pub timestamp: String,
    /// Workspace directory the assistant was running in.
    pub project_path: String,
}

/// Prices in USD per million tokens for one model family.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricingRate {
    /// Price per million input tokens.
    pub input: f64,
    /// Price per million output tokens.
    pub output: f64,
    /// Price per million cache-write tokens.
    pub cache_write: f64,
    /// Price per million cache-read tokens.
    pub cache_read: f64,
}

/// Aggregated usage attributed to one model identifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ModelUsage {
    /// Exact model identifier this row aggregates.
    pub model: String,
    /// Accumulated input tokens.
    pub input_tokens: u64,
    /// Accumulated output tokens.
    pub output_tokens: u64,
    /// Accumulated cache-creation tokens.
    pub cache_creation_tokens: u64,
    /// Accumulated cache-read tokens.
    pub cache_read_tokens: u64,
    /// Sum of the four token categories above.
    pub total_tokens: u64,
    /// Cost in USD attributed to this model.
    pub total_cost: f64,
    /// Number of usage entries that carried token data.
    pub session_count: u64,
}

/// Aggregated usage attributed to one project directory.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProjectUsage {
    /// Full project path this row aggregates.
    pub project_path: String,
    /// Display name derived from the final path segment.
    pub project_name: String,
    /// Cost in USD attributed to this project.
    pub total_cost: f64,
    /// Accumulated total tokens.
    pub total_tokens: u64,
    /// Number of usage entries that carried token data.
    pub session_count: u64,
    /// Most recent timestamp string seen for this project.
    pub last_used: String,
}

/// Aggregated usage for one calendar month (`"YYYY-MM"`, UTC).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MonthlyUsage {
    /// Month key, the first seven characters of the raw timestamp.
    pub month: String,
    /// Cost in USD for the month.
    pub total_cost: f64,
    /// Accumulated total tokens.
    pub total_tokens: u64,
    /// Number of usage entries that carried token data.
    pub session_count: u64,
    /// Distinct models seen, in first-seen order.
    pub models_used: Vec<String>,
}

/// Aggregated usage for one local calendar day (`"YYYY-MM-DD"`).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DailyUsage {
    /// Local calendar date key.
    pub date: String,
    /// Cost in USD for the day.
    pub total_cost: f64,
    /// Accumulated total tokens.
    pub total_tokens: u64,
    /// Distinct models seen, in first-seen order.
    pub models_used: Vec<String>,
}

/// Aggregated usage for one local clock hour (`"YYYY-MM-DDTHH"`).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HourlyUsage {
    /// Local hour key.
    pub hour: String,
    /// Cost in USD for the hour.
    pub total_cost: f64,
    /// Accumulated total tokens.
    pub total_tokens: u64,
    /// Distinct models seen, in first-seen order.
    pub models_used: Vec<String>,
}

/// Bucketing-independent sums across an entire entry set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OverallTotals {
    /// Total cost in USD.
    pub total_cost: f64,
    /// Total tokens across all categories.
    pub total_tokens: u64,
    /// Number of usage entries that carried token data.
    pub session_count: u64,
}

/// The complete statistics report consumed by presentation layers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UsageStatistics {
    /// Overall sums across every entry.
    pub totals: OverallTotals,
    /// Per-model rows, most expensive first.
    pub by_model: Vec<ModelUsage>,
    /// Per-project rows, most expensive first.
    pub by_project: Vec<ProjectUsage>,
    /// Per-month rows, most recent first.
    pub by_month: Vec<MonthlyUsage>,
    /// Per-day rows, most recent first.
    pub by_day: Vec<DailyUsage>,
    /// Per-hour rows, most recent first.
    pub by_hour: Vec<HourlyUsage>,
    /// Earliest and latest raw timestamp strings, `("", "")` when empty.
    pub date_range: (String, String),
}

/// Derive a short display name for a project from its path.
///
/// Takes the final path segment, ignoring trailing separators; when no
/// segment can be extracted the raw path is returned unchanged.
///
/// # Examples
///
/// ```
/// use ledger_core::models::project_display_name;
///
/// assert_eq!(project_display_name("/home/kai/work/api-server"), "api-server");
/// assert_eq!(project_display_name("standalone"), "standalone");
/// assert_eq!(project_display_name("/"), "/");
/// ```
pub fn project_display_name(path: &str) -> String {
    std::path::Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}
