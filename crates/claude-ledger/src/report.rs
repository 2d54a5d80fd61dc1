//! Plain-text rendering of usage statistics.
//!
//! Each view is a small aligned table built from one [`UsageStatistics`]
//! value. Rendering never touches the pipeline; it only formats what the
//! query layer already computed.

use std::path::Path;

use ledger_core::formatting::{format_currency, format_tokens, percentage};
use ledger_core::models::UsageStatistics;

/// Render `stats` as the requested view.
///
/// `top` caps the number of rows in the model and project rankings.
/// Unrecognised view names fall back to the summary.
pub fn render(stats: &UsageStatistics, view: &str, top: usize) -> String {
    match view {
        "daily" => daily(stats),
        "monthly" => monthly(stats),
        "hourly" => hourly(stats),
        "models" => models(stats, top),
        "projects" => projects(stats, top),
        _ => summary(stats, top),
    }
}

/// Message for a log root that yielded no entries at all.
///
/// Worded to separate the first-run case from an unreadable or misconfigured
/// directory; genuine processing errors never reach this path.
pub fn no_data_hint(data_path: &Path) -> String {
    format!(
        "No usage data found under {}.\n\
         If Claude Code has not been used on this machine yet, there is nothing\n\
         to report. Otherwise check that the directory is readable and contains\n\
         .jsonl log files, or point --data-path at the right location.",
        data_path.display()
    )
}

// ── Views ─────────────────────────────────────────────────────────────────────

fn summary(stats: &UsageStatistics, top: usize) -> String {
    let mut lines = vec![
        "Claude Code usage".to_string(),
        format!("  Period:   {}", span(&stats.date_range)),
        format!("  Sessions: {}", stats.totals.session_count),
        format!("  Tokens:   {}", format_tokens(stats.totals.total_tokens)),
        format!("  Cost:     {}", format_currency(stats.totals.total_cost)),
    ];

    if !stats.by_model.is_empty() {
        lines.push(String::new());
        lines.push("Top models".to_string());
        lines.extend(model_rows(stats, top));
    }
    if !stats.by_project.is_empty() {
        lines.push(String::new());
        lines.push("Top projects".to_string());
        lines.extend(project_rows(stats, top));
    }

    lines.join("\n")
}

fn models(stats: &UsageStatistics, top: usize) -> String {
    let mut lines = vec![format!(
        "{:<40} {:>10} {:>12} {:>7}",
        "MODEL", "TOKENS", "COST", "SHARE"
    )];
    lines.extend(model_rows(stats, top));
    lines.join("\n")
}

fn projects(stats: &UsageStatistics, top: usize) -> String {
    let mut lines = vec![format!(
        "{:<24} {:>9} {:>10} {:>12}  {}",
        "PROJECT", "SESSIONS", "TOKENS", "COST", "LAST USED"
    )];
    lines.extend(project_rows(stats, top));
    lines.join("\n")
}

fn daily(stats: &UsageStatistics) -> String {
    let mut lines = vec![format!(
        "{:<12} {:>10} {:>12}  {}",
        "DATE", "TOKENS", "COST", "MODELS"
    )];
    for day in &stats.by_day {
        lines.push(format!(
            "{:<12} {:>10} {:>12}  {}",
            day.date,
            format_tokens(day.total_tokens),
            format_currency(day.total_cost),
            day.models_used.join(", "),
        ));
    }
    push_totals(&mut lines, stats);
    lines.join("\n")
}

fn monthly(stats: &UsageStatistics) -> String {
    let mut lines = vec![format!(
        "{:<8} {:>9} {:>10} {:>12}  {}",
        "MONTH", "SESSIONS", "TOKENS", "COST", "MODELS"
    )];
    for month in &stats.by_month {
        lines.push(format!(
            "{:<8} {:>9} {:>10} {:>12}  {}",
            month.month,
            month.session_count,
            format_tokens(month.total_tokens),
            format_currency(month.total_cost),
            month.models_used.join(", "),
        ));
    }
    push_totals(&mut lines, stats);
    lines.join("\n")
}

fn hourly(stats: &UsageStatistics) -> String {
    let mut lines = vec![format!(
        "{:<14} {:>10} {:>12}  {}",
        "HOUR", "TOKENS", "COST", "MODELS"
    )];
    for hour in &stats.by_hour {
        lines.push(format!(
            "{:<14} {:>10} {:>12}  {}",
            hour.hour,
            format_tokens(hour.total_tokens),
            format_currency(hour.total_cost),
            hour.models_used.join(", "),
        ));
    }
    push_totals(&mut lines, stats);
    lines.join("\n")
}

// ── Row helpers ───────────────────────────────────────────────────────────────

fn model_rows(stats: &UsageStatistics, top: usize) -> Vec<String> {
    stats
        .by_model
        .iter()
        .take(top)
        .map(|m| {
            format!(
                "{:<40} {:>10} {:>12} {:>6.1}%",
                m.model,
                format_tokens(m.total_tokens),
                format_currency(m.total_cost),
                percentage(m.total_cost, stats.totals.total_cost, 1),
            )
        })
        .collect()
}

fn project_rows(stats: &UsageStatistics, top: usize) -> Vec<String> {
    stats
        .by_project
        .iter()
        .take(top)
        .map(|p| {
            format!(
                "{:<24} {:>9} {:>10} {:>12}  {}",
                p.project_name,
                p.session_count,
                format_tokens(p.total_tokens),
                format_currency(p.total_cost),
                p.last_used,
            )
        })
        .collect()
}

fn push_totals(lines: &mut Vec<String>, stats: &UsageStatistics) {
    lines.push(String::new());
    lines.push(format!(
        "Total: {} tokens, {} across {} sessions",
        format_tokens(stats.totals.total_tokens),
        format_currency(stats.totals.total_cost),
        stats.totals.session_count,
    ));
}

fn span(range: &(String, String)) -> String {
    if range.0.is_empty() {
        "-".to_string()
    } else {
        format!("{} .. {}", range.0, range.1)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
