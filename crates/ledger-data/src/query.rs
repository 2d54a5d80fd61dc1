//! High-level usage queries over the on-disk logs.
//!
//! [`UsageQueryFacade`] composes discovery, parsing, and aggregation behind
//! convenience methods. Every query loads fresh from disk; callers that need
//! caching or periodic refresh wrap the facade in `ledger-runtime`.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use ledger_core::error::{LedgerError, Result};
use ledger_core::models::{ModelUsage, ProjectUsage, UsageEntry, UsageStatistics};
use ledger_core::pricing::PricingEngine;
use ledger_core::time_utils::{month_prefix, system_timezone};
use tracing::{debug, warn};

use crate::aggregator::UsageAggregator;
use crate::parser::{filters, LogRecordParser, ParsePolicy};

// ── UsageQueryFacade ──────────────────────────────────────────────────────────

/// Loads, filters, and aggregates usage logs rooted at one directory.
pub struct UsageQueryFacade {
    data_path: PathBuf,
    parser: LogRecordParser,
    pricing: PricingEngine,
    local_tz: Tz,
}

impl UsageQueryFacade {
    /// Facade over `data_path` with a lenient parser and the system timezone.
    pub fn new(data_path: impl Into<PathBuf>) -> Self {
        Self::with_options(data_path, ParsePolicy::Lenient, system_timezone())
    }

    /// Facade with an explicit parse policy and bucketing timezone.
    pub fn with_options(data_path: impl Into<PathBuf>, policy: ParsePolicy, local_tz: Tz) -> Self {
        Self {
            data_path: data_path.into(),
            parser: LogRecordParser::new(policy),
            pricing: PricingEngine::new(),
            local_tz,
        }
    }

    /// The configured log root.
    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    /// The held pricing engine.
    pub fn pricing(&self) -> &PricingEngine {
        &self.pricing
    }

    /// Mutable access for registering pricing overrides.
    pub fn pricing_mut(&mut self) -> &mut PricingEngine {
        &mut self.pricing
    }

    // ── Full statistics ───────────────────────────────────────────────────────

    /// Load every log file under the root and aggregate all entries.
    ///
    /// Fails with [`LedgerError::NoUsageData`] when no entry survives
    /// parsing; strict-mode parse failures propagate unchanged.
    pub fn usage_statistics(&self) -> Result<UsageStatistics> {
        let entries = self.load_entries()?;
        if entries.is_empty() {
            return Err(LedgerError::NoUsageData);
        }
        Ok(self.aggregate(&entries))
    }

    /// Parse every discovered file into a flat entry list.
    pub fn load_entries(&self) -> Result<Vec<UsageEntry>> {
        let outcome = self.parser.load_directory(&self.data_path)?;
        if !outcome.diagnostics.is_empty() {
            debug!(
                "{} lines dropped while loading {}",
                outcome.diagnostics.len(),
                self.data_path.display()
            );
        }
        Ok(outcome.entries)
    }

    // ── Filtered statistics ───────────────────────────────────────────────────
    //
    // These degrade instead of failing: any load error yields zeroed
    // statistics, as does a filter that matches nothing.

    /// Statistics restricted to one `"YYYY-MM"` month.
    pub fn statistics_for_month(&self, month: &str) -> UsageStatistics {
        self.filtered_statistics(|entries| filters::by_month(entries, month))
    }

    /// Statistics for the inclusive `"YYYY-MM"` month range `[start, end]`.
    pub fn statistics_for_month_range(&self, start: &str, end: &str) -> UsageStatistics {
        self.filtered_statistics(|entries| {
            entries
                .iter()
                .filter(|e| {
                    let month = month_prefix(&e.timestamp);
                    month >= start && month <= end
                })
                .cloned()
                .collect()
        })
    }

    /// Statistics restricted to one exact project path.
    pub fn statistics_for_project(&self, project_path: &str) -> UsageStatistics {
        self.filtered_statistics(|entries| filters::by_project(entries, project_path))
    }

    /// Statistics restricted to one exact model identifier.
    pub fn statistics_for_model(&self, model: &str) -> UsageStatistics {
        self.filtered_statistics(|entries| filters::by_model(entries, model))
    }

    /// Statistics for the inclusive timestamp range `[start, end]`.
    pub fn statistics_for_date_range(&self, start: &str, end: &str) -> UsageStatistics {
        self.filtered_statistics(|entries| filters::by_date_range(entries, start, end))
    }

    /// Statistics for one project within one month.
    pub fn statistics_for_project_month(&self, project_path: &str, month: &str) -> UsageStatistics {
        self.filtered_statistics(|entries| {
            filters::by_month(&filters::by_project(entries, project_path), month)
        })
    }

    /// Statistics for one model within one month.
    pub fn statistics_for_model_month(&self, model: &str, month: &str) -> UsageStatistics {
        self.filtered_statistics(|entries| {
            filters::by_month(&filters::by_model(entries, model), month)
        })
    }

    // ── Rankings ──────────────────────────────────────────────────────────────

    /// The `n` most expensive projects, descending cost.
    pub fn top_projects_by_cost(&self, n: usize) -> Vec<ProjectUsage> {
        let mut projects = self.all_statistics().by_project;
        projects.truncate(n);
        projects
    }

    /// The `n` most expensive models, descending cost.
    pub fn top_models_by_cost(&self, n: usize) -> Vec<ModelUsage> {
        let mut models = self.all_statistics().by_model;
        models.truncate(n);
        models
    }

    // ── Discovery ─────────────────────────────────────────────────────────────

    /// Distinct project paths across all entries, ascending.
    pub fn known_projects(&self) -> Vec<String> {
        let set: BTreeSet<String> = self
            .entries_or_empty()
            .into_iter()
            .map(|e| e.project_path)
            .collect();
        set.into_iter().collect()
    }

    /// Distinct model identifiers across all entries, ascending.
    pub fn known_models(&self) -> Vec<String> {
        let set: BTreeSet<String> = self
            .entries_or_empty()
            .into_iter()
            .map(|e| e.model)
            .collect();
        set.into_iter().collect()
    }

    /// Distinct `"YYYY-MM"` months across all entries, newest first.
    pub fn known_months(&self) -> Vec<String> {
        let set: BTreeSet<String> = self
            .entries_or_empty()
            .into_iter()
            .map(|e| month_prefix(&e.timestamp).to_string())
            .collect();
        set.into_iter().rev().collect()
    }

    // ── Private ───────────────────────────────────────────────────────────────

    fn aggregate(&self, entries: &[UsageEntry]) -> UsageStatistics {
        UsageAggregator::with_timezone(&self.pricing, self.local_tz)
            .generate_usage_statistics(entries)
    }

    fn all_statistics(&self) -> UsageStatistics {
        let entries = self.entries_or_empty();
        self.aggregate(&entries)
    }

    fn filtered_statistics<F>(&self, filter: F) -> UsageStatistics
    where
        F: FnOnce(&[UsageEntry]) -> Vec<UsageEntry>,
    {
        let entries = self.entries_or_empty();
        self.aggregate(&filter(&entries))
    }

    fn entries_or_empty(&self) -> Vec<UsageEntry> {
        match self.load_entries() {
            Ok(entries) => entries,
            Err(err) => {
                warn!("Query degraded to empty result: {}", err);
                Vec::new()
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
