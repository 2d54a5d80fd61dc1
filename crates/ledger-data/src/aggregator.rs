//! Multi-dimensional usage aggregation.
//!
//! Folds parsed entries into the five aggregate views (model, project,
//! month, day, hour) plus overall totals and the covered timestamp range.
//! Costs come from a borrowed [`PricingEngine`]; day and hour keys are
//! computed in a configurable local timezone.

use std::collections::BTreeMap;

use chrono_tz::Tz;
use ledger_core::models::{
    project_display_name, DailyUsage, HourlyUsage, ModelUsage, MonthlyUsage, OverallTotals,
    ProjectUsage, UsageEntry, UsageStatistics,
};
use ledger_core::pricing::PricingEngine;
use ledger_core::time_utils::{local_day_key, local_hour_key, month_prefix, system_timezone};

// ── UsageAggregator ───────────────────────────────────────────────────────────

/// Pure folds over `&[UsageEntry]`.
///
/// Every view skips entries whose usage counts are entirely empty; only
/// [`UsageAggregator::date_range`] considers all entries. Each method walks
/// the input once and returns owned results, so repeated calls over the same
/// slice always produce the same output.
pub struct UsageAggregator<'a> {
    pricing: &'a PricingEngine,
    local_tz: Tz,
}

impl<'a> UsageAggregator<'a> {
    /// Aggregator using the system timezone for day and hour bucketing.
    pub fn new(pricing: &'a PricingEngine) -> Self {
        Self::with_timezone(pricing, system_timezone())
    }

    /// Aggregator with an explicit bucketing timezone.
    pub fn with_timezone(pricing: &'a PricingEngine, local_tz: Tz) -> Self {
        Self { pricing, local_tz }
    }

    /// The timezone used for day and hour keys.
    pub fn timezone(&self) -> Tz {
        self.local_tz
    }

    /// Per-model totals, most expensive first.
    pub fn by_model(&self, entries: &[UsageEntry]) -> Vec<ModelUsage> {
        let mut map: BTreeMap<String, ModelUsage> = BTreeMap::new();

        for entry in entries.iter().filter(|e| !e.counts.is_empty()) {
            let usage = map.entry(entry.model.clone()).or_insert_with(|| ModelUsage {
                model: entry.model.clone(),
                ..Default::default()
            });
            usage.input_tokens += entry.counts.input_tokens.unwrap_or(0);
            usage.output_tokens += entry.counts.output_tokens.unwrap_or(0);
            usage.cache_creation_tokens += entry.counts.cache_creation_tokens.unwrap_or(0);
            usage.cache_read_tokens += entry.counts.cache_read_tokens.unwrap_or(0);
            usage.total_tokens += entry.counts.total_tokens();
            usage.total_cost += self.pricing.cost(&entry.model, &entry.counts);
            usage.session_count += 1;
        }

        let mut result: Vec<ModelUsage> = map.into_values().collect();
        result.sort_by(|a, b| b.total_cost.total_cmp(&a.total_cost));
        result
    }

    /// Per-project totals, most expensive first.
    ///
    /// `last_used` is the maximum timestamp seen for the project and
    /// `project_name` the last path segment of its key.
    pub fn by_project(&self, entries: &[UsageEntry]) -> Vec<ProjectUsage> {
        let mut map: BTreeMap<String, ProjectUsage> = BTreeMap::new();

        for entry in entries.iter().filter(|e| !e.counts.is_empty()) {
            let usage = map
                .entry(entry.project_path.clone())
                .or_insert_with(|| ProjectUsage {
                    project_path: entry.project_path.clone(),
                    project_name: project_display_name(&entry.project_path),
                    ..Default::default()
                });
            usage.total_cost += self.pricing.cost(&entry.model, &entry.counts);
            usage.total_tokens += entry.counts.total_tokens();
            usage.session_count += 1;
            if entry.timestamp > usage.last_used {
                usage.last_used = entry.timestamp.clone();
            }
        }

        let mut result: Vec<ProjectUsage> = map.into_values().collect();
        result.sort_by(|a, b| b.total_cost.total_cmp(&a.total_cost));
        result
    }

    /// Per-month totals keyed by the raw `"YYYY-MM"` timestamp prefix,
    /// newest month first.
    pub fn by_month(&self, entries: &[UsageEntry]) -> Vec<MonthlyUsage> {
        let mut map: BTreeMap<String, MonthlyUsage> = BTreeMap::new();

        for entry in entries.iter().filter(|e| !e.counts.is_empty()) {
            let key = month_prefix(&entry.timestamp).to_string();
            let usage = map.entry(key.clone()).or_insert_with(|| MonthlyUsage {
                month: key,
                ..Default::default()
            });
            usage.total_cost += self.pricing.cost(&entry.model, &entry.counts);
            usage.total_tokens += entry.counts.total_tokens();
            usage.session_count += 1;
            if !usage.models_used.contains(&entry.model) {
                usage.models_used.push(entry.model.clone());
            }
        }

        map.into_values().rev().collect()
    }

    /// Per-day totals keyed by the local calendar date, newest day first.
    pub fn by_day(&self, entries: &[UsageEntry]) -> Vec<DailyUsage> {
        let mut map: BTreeMap<String, DailyUsage> = BTreeMap::new();

        for entry in entries.iter().filter(|e| !e.counts.is_empty()) {
            let key = local_day_key(&entry.timestamp, &self.local_tz);
            let usage = map.entry(key.clone()).or_insert_with(|| DailyUsage {
                date: key,
                ..Default::default()
            });
            usage.total_cost += self.pricing.cost(&entry.model, &entry.counts);
            usage.total_tokens += entry.counts.total_tokens();
            if !usage.models_used.contains(&entry.model) {
                usage.models_used.push(entry.model.clone());
            }
        }

        map.into_values().rev().collect()
    }

    /// Per-hour totals keyed by the local `"YYYY-MM-DDTHH"`, newest first.
    pub fn by_hour(&self, entries: &[UsageEntry]) -> Vec<HourlyUsage> {
        let mut map: BTreeMap<String, HourlyUsage> = BTreeMap::new();

        for entry in entries.iter().filter(|e| !e.counts.is_empty()) {
            let key = local_hour_key(&entry.timestamp, &self.local_tz);
            let usage = map.entry(key.clone()).or_insert_with(|| HourlyUsage {
                hour: key,
                ..Default::default()
            });
            usage.total_cost += self.pricing.cost(&entry.model, &entry.counts);
            usage.total_tokens += entry.counts.total_tokens();
            if !usage.models_used.contains(&entry.model) {
                usage.models_used.push(entry.model.clone());
            }
        }

        map.into_values().rev().collect()
    }

    /// Bucketing-independent cost, token, and session totals.
    pub fn overall(&self, entries: &[UsageEntry]) -> OverallTotals {
        let mut totals = OverallTotals::default();
        for entry in entries.iter().filter(|e| !e.counts.is_empty()) {
            totals.total_cost += self.pricing.cost(&entry.model, &entry.counts);
            totals.total_tokens += entry.counts.total_tokens();
            totals.session_count += 1;
        }
        totals
    }

    /// Minimum and maximum raw timestamp strings across all entries,
    /// including those without usage counts. `("", "")` for empty input.
    pub fn date_range(&self, entries: &[UsageEntry]) -> (String, String) {
        let mut timestamps = entries.iter().map(|e| e.timestamp.as_str());
        let Some(first) = timestamps.next() else {
            return (String::new(), String::new());
        };

        let (mut earliest, mut latest) = (first, first);
        for ts in timestamps {
            if ts < earliest {
                earliest = ts;
            }
            if ts > latest {
                latest = ts;
            }
        }
        (earliest.to_string(), latest.to_string())
    }

    /// Full report: all five views plus totals and the date range.
    pub fn generate_usage_statistics(&self, entries: &[UsageEntry]) -> UsageStatistics {
        UsageStatistics {
            totals: self.overall(entries),
            by_model: self.by_model(entries),
            by_project: self.by_project(entries),
            by_month: self.by_month(entries),
            by_day: self.by_day(entries),
            by_hour: self.by_hour(entries),
            date_range: self.date_range(entries),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_core::models::UsageCounts;

    fn make_entry(model: &str, input: u64, output: u64, ts: &str, project: &str) -> UsageEntry {
        UsageEntry {
            model: model.to_string(),
            counts: UsageCounts {
                input_tokens: Some(input),
                output_tokens: Some(output),
                ..Default::default()
            },
            timestamp: ts.to_string(),
            project_path: project.to_string(),
        }
    }

    fn empty_entry(ts: &str) -> UsageEntry {
        UsageEntry {
            model: "claude-sonnet-4".to_string(),
            counts: UsageCounts::default(),
            timestamp: ts.to_string(),
            project_path: "/p".to_string(),
        }
    }

    fn pinned<'a>(pricing: &'a PricingEngine) -> UsageAggregator<'a> {
        UsageAggregator::with_timezone(pricing, Tz::UTC)
    }

    // ── by_model ──────────────────────────────────────────────────────────────

    #[test]
    fn test_by_model_groups_and_sums() {
        let pricing = PricingEngine::new();
        let agg = pinned(&pricing);
        let entries = vec![
            make_entry("claude-sonnet-4", 100, 50, "2025-01-15T10:00:00Z", "/p"),
            make_entry("claude-sonnet-4", 200, 100, "2025-01-15T11:00:00Z", "/p"),
            make_entry("claude-opus-4", 10, 5, "2025-01-15T12:00:00Z", "/p"),
        ];

        let models = agg.by_model(&entries);
        assert_eq!(models.len(), 2);
        let sonnet = models
            .iter()
            .find(|m| m.model == "claude-sonnet-4")
            .unwrap();
        assert_eq!(sonnet.input_tokens, 300);
        assert_eq!(sonnet.output_tokens, 150);
        assert_eq!(sonnet.total_tokens, 450);
        assert_eq!(sonnet.session_count, 2);
    }

    #[test]
    fn test_by_model_single_entry_mirrors_raw_counts() {
        let pricing = PricingEngine::new();
        let agg = pinned(&pricing);
        let entries = vec![UsageEntry {
            model: "claude-sonnet-4".to_string(),
            counts: UsageCounts {
                input_tokens: Some(1_000),
                output_tokens: Some(500),
                cache_creation_tokens: Some(200),
                cache_read_tokens: Some(100),
            },
            timestamp: "2025-01-15T10:00:00Z".to_string(),
            project_path: "/p".to_string(),
        }];

        let models = agg.by_model(&entries);
        assert_eq!(models.len(), 1);
        assert_eq!(models[0].session_count, 1);
        assert_eq!(models[0].input_tokens, 1_000);
        assert_eq!(models[0].output_tokens, 500);
        assert_eq!(models[0].cache_creation_tokens, 200);
        assert_eq!(models[0].cache_read_tokens, 100);
        assert_eq!(models[0].total_tokens, 1_800);
    }

    #[test]
    fn test_by_model_sorted_by_cost_descending() {
        let pricing = PricingEngine::new();
        let agg = pinned(&pricing);
        // Equal token counts, but opus rates dominate sonnet rates.
        let entries = vec![
            make_entry("claude-sonnet-4", 1000, 500, "2025-01-15T10:00:00Z", "/p"),
            make_entry("claude-opus-4", 1000, 500, "2025-01-15T11:00:00Z", "/p"),
        ];

        let models = agg.by_model(&entries);
        assert_eq!(models[0].model, "claude-opus-4");
        assert_eq!(models[1].model, "claude-sonnet-4");
        assert!(models[0].total_cost > models[1].total_cost);
    }

    #[test]
    fn test_by_model_skips_entries_without_usage() {
        let pricing = PricingEngine::new();
        let agg = pinned(&pricing);
        let entries = vec![
            empty_entry("2025-01-15T10:00:00Z"),
            make_entry("claude-sonnet-4", 100, 0, "2025-01-15T11:00:00Z", "/p"),
        ];

        let models = agg.by_model(&entries);
        assert_eq!(models.len(), 1);
        assert_eq!(models[0].session_count, 1);
    }

    // ── by_project ────────────────────────────────────────────────────────────

    #[test]
    fn test_by_project_name_and_last_used() {
        let pricing = PricingEngine::new();
        let agg = pinned(&pricing);
        let entries = vec![
            make_entry(
                "claude-sonnet-4",
                100,
                50,
                "2025-01-15T10:00:00Z",
                "/Users/test/widget",
            ),
            make_entry(
                "claude-sonnet-4",
                200,
                100,
                "2025-01-20T10:00:00Z",
                "/Users/test/widget",
            ),
        ];

        let projects = agg.by_project(&entries);
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].project_name, "widget");
        assert_eq!(projects[0].last_used, "2025-01-20T10:00:00Z");
        assert_eq!(projects[0].session_count, 2);
    }

    #[test]
    fn test_by_project_sorted_by_cost_descending() {
        let pricing = PricingEngine::new();
        let agg = pinned(&pricing);
        let entries = vec![
            make_entry("claude-sonnet-4", 10, 5, "2025-01-15T10:00:00Z", "/a"),
            make_entry("claude-sonnet-4", 10_000, 5000, "2025-01-15T11:00:00Z", "/b"),
        ];

        let projects = agg.by_project(&entries);
        assert_eq!(projects[0].project_path, "/b");
        assert_eq!(projects[1].project_path, "/a");
    }

    // ── by_month ──────────────────────────────────────────────────────────────

    #[test]
    fn test_by_month_buckets_on_raw_prefix() {
        let pricing = PricingEngine::new();
        let agg = pinned(&pricing);
        let entries = vec![
            make_entry("claude-sonnet-4", 100, 50, "2025-01-15T10:30:00Z", "/p"),
            make_entry("claude-sonnet-4", 100, 50, "2025-02-01T09:15:00Z", "/p"),
            make_entry("claude-sonnet-4", 100, 50, "2025-01-16T14:45:00Z", "/p"),
        ];

        let months = agg.by_month(&entries);
        assert_eq!(months.len(), 2);
        // Newest month first.
        assert_eq!(months[0].month, "2025-02");
        assert_eq!(months[0].session_count, 1);
        assert_eq!(months[1].month, "2025-01");
        assert_eq!(months[1].session_count, 2);
    }

    #[test]
    fn test_by_month_models_used_deduplicated_in_first_seen_order() {
        let pricing = PricingEngine::new();
        let agg = pinned(&pricing);
        let entries = vec![
            make_entry("claude-sonnet-4", 1, 1, "2025-01-15T10:00:00Z", "/p"),
            make_entry("claude-opus-4", 1, 1, "2025-01-16T10:00:00Z", "/p"),
            make_entry("claude-sonnet-4", 1, 1, "2025-01-17T10:00:00Z", "/p"),
        ];

        let months = agg.by_month(&entries);
        assert_eq!(
            months[0].models_used,
            vec!["claude-sonnet-4", "claude-opus-4"]
        );
    }

    // ── by_day / by_hour ──────────────────────────────────────────────────────

    #[test]
    fn test_by_day_uses_local_calendar_date() {
        let pricing = PricingEngine::new();
        let agg = UsageAggregator::with_timezone(&pricing, Tz::Asia__Tokyo);
        // 23:30 UTC on the 15th is already the 16th in Tokyo.
        let entries = vec![make_entry(
            "claude-sonnet-4",
            100,
            50,
            "2025-01-15T23:30:00Z",
            "/p",
        )];

        let days = agg.by_day(&entries);
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].date, "2025-01-16");
    }

    #[test]
    fn test_by_day_newest_first() {
        let pricing = PricingEngine::new();
        let agg = pinned(&pricing);
        let entries = vec![
            make_entry("claude-sonnet-4", 1, 1, "2025-01-10T10:00:00Z", "/p"),
            make_entry("claude-sonnet-4", 1, 1, "2025-01-20T10:00:00Z", "/p"),
            make_entry("claude-sonnet-4", 1, 1, "2025-01-15T10:00:00Z", "/p"),
        ];

        let days = agg.by_day(&entries);
        let keys: Vec<&str> = days.iter().map(|d| d.date.as_str()).collect();
        assert_eq!(keys, vec!["2025-01-20", "2025-01-15", "2025-01-10"]);
    }

    #[test]
    fn test_by_hour_key_format() {
        let pricing = PricingEngine::new();
        let agg = pinned(&pricing);
        let entries = vec![
            make_entry("claude-sonnet-4", 1, 1, "2025-01-15T10:05:00Z", "/p"),
            make_entry("claude-sonnet-4", 1, 1, "2025-01-15T10:55:00Z", "/p"),
            make_entry("claude-sonnet-4", 1, 1, "2025-01-15T11:05:00Z", "/p"),
        ];

        let hours = agg.by_hour(&entries);
        assert_eq!(hours.len(), 2);
        assert_eq!(hours[0].hour, "2025-01-15T11");
        assert_eq!(hours[1].hour, "2025-01-15T10");
        assert_eq!(hours[1].total_tokens, 4);
    }

    // ── overall / date_range ──────────────────────────────────────────────────

    #[test]
    fn test_overall_matches_model_view_sums() {
        let pricing = PricingEngine::new();
        let agg = pinned(&pricing);
        let entries = vec![
            make_entry("claude-sonnet-4", 1000, 500, "2025-01-15T10:00:00Z", "/p"),
            make_entry("claude-opus-4", 1000, 500, "2025-01-15T11:00:00Z", "/p"),
            make_entry("mystery-model", 1000, 500, "2025-01-15T12:00:00Z", "/p"),
            empty_entry("2025-01-15T13:00:00Z"),
        ];

        let totals = agg.overall(&entries);
        let models = agg.by_model(&entries);

        let model_tokens: u64 = models.iter().map(|m| m.total_tokens).sum();
        let model_cost: f64 = models.iter().map(|m| m.total_cost).sum();
        let model_sessions: u64 = models.iter().map(|m| m.session_count).sum();

        assert_eq!(totals.total_tokens, model_tokens);
        assert_eq!(totals.session_count, model_sessions);
        assert!((totals.total_cost - model_cost).abs() < f64::EPSILON);
    }

    #[test]
    fn test_date_range_spans_all_entries() {
        let pricing = PricingEngine::new();
        let agg = pinned(&pricing);
        // The empty-usage entry carries the latest timestamp and still counts.
        let entries = vec![
            make_entry("claude-sonnet-4", 1, 1, "2025-01-15T10:00:00Z", "/p"),
            make_entry("claude-sonnet-4", 1, 1, "2025-01-10T10:00:00Z", "/p"),
            empty_entry("2025-02-01T00:00:00Z"),
        ];

        let (earliest, latest) = agg.date_range(&entries);
        assert_eq!(earliest, "2025-01-10T10:00:00Z");
        assert_eq!(latest, "2025-02-01T00:00:00Z");
    }

    #[test]
    fn test_empty_input_aggregates_to_zeroes() {
        let pricing = PricingEngine::new();
        let agg = pinned(&pricing);

        let stats = agg.generate_usage_statistics(&[]);
        assert_eq!(stats.totals.total_cost, 0.0);
        assert_eq!(stats.totals.total_tokens, 0);
        assert_eq!(stats.totals.session_count, 0);
        assert!(stats.by_model.is_empty());
        assert!(stats.by_project.is_empty());
        assert!(stats.by_month.is_empty());
        assert!(stats.by_day.is_empty());
        assert!(stats.by_hour.is_empty());
        assert_eq!(stats.date_range, (String::new(), String::new()));
    }

    // ── generate_usage_statistics ─────────────────────────────────────────────

    #[test]
    fn test_generate_usage_statistics_is_deterministic() {
        let pricing = PricingEngine::new();
        let agg = pinned(&pricing);
        let entries = vec![
            make_entry("claude-sonnet-4", 1000, 500, "2025-01-15T10:00:00Z", "/a"),
            make_entry("claude-opus-4", 200, 100, "2025-02-01T10:00:00Z", "/b"),
            make_entry("claude-haiku-3.5", 50, 25, "2025-02-02T10:00:00Z", "/a"),
        ];

        let first = agg.generate_usage_statistics(&entries);
        let second = agg.generate_usage_statistics(&entries);
        assert_eq!(first, second);
    }

    #[test]
    fn test_generate_usage_statistics_composes_views() {
        let pricing = PricingEngine::new();
        let agg = pinned(&pricing);
        let entries = vec![
            make_entry("claude-sonnet-4", 1000, 500, "2025-01-15T10:00:00Z", "/a"),
            make_entry("claude-opus-4", 200, 100, "2025-02-01T10:00:00Z", "/b"),
        ];

        let stats = agg.generate_usage_statistics(&entries);
        assert_eq!(stats.by_model.len(), 2);
        assert_eq!(stats.by_project.len(), 2);
        assert_eq!(stats.by_month.len(), 2);
        assert_eq!(stats.by_day.len(), 2);
        assert_eq!(stats.by_hour.len(), 2);
        assert_eq!(stats.totals.session_count, 2);
        assert_eq!(
            stats.date_range,
            (
                "2025-01-15T10:00:00Z".to_string(),
                "2025-02-01T10:00:00Z".to_string()
            )
        );
    }
}
