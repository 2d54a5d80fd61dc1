//! TTL-cached statistics access for the ledger runtime.
//!
//! Wraps [`UsageQueryFacade::usage_statistics`] with a configurable
//! time-to-live cache and transparent retry logic. Callers use
//! [`StatsCache::get`] to obtain fresh-or-cached [`UsageStatistics`]; the
//! cache handles staleness checks, up to three fetch attempts with
//! back-off, and graceful fallback to the previous result on transient
//! failure.

use std::thread;
use std::time::{Duration, Instant};

use ledger_core::error::LedgerError;
use ledger_core::models::UsageStatistics;
use ledger_data::query::UsageQueryFacade;

// ── Defaults ──────────────────────────────────────────────────────────────────

/// Default cache TTL in seconds.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 30;

/// Maximum number of fetch attempts before giving up and returning stale data.
const MAX_RETRY_ATTEMPTS: u32 = 3;

// ── StatsCache ────────────────────────────────────────────────────────────────

/// TTL-cached wrapper around the full query pipeline.
///
/// An empty log root is a valid cacheable state, not a failure: it is stored
/// as zeroed statistics and leaves [`StatsCache::last_error`] untouched.
///
/// # Example
/// ```no_run
/// use ledger_data::query::UsageQueryFacade;
/// use ledger_runtime::stats_cache::StatsCache;
/// use std::time::Duration;
///
/// let facade = UsageQueryFacade::new("/home/me/.claude/projects");
/// let mut cache = StatsCache::new(facade, Duration::from_secs(30));
/// if let Some(stats) = cache.get(false) {
///     println!("total cost: {}", stats.totals.total_cost);
/// }
/// ```
pub struct StatsCache {
    /// The query facade every fetch goes through.
    facade: UsageQueryFacade,
    /// Maximum age of cached statistics before they are considered stale.
    cache_ttl: Duration,
    /// Most recently fetched statistics.
    cache: Option<UsageStatistics>,
    /// When the cache was last populated.
    cache_timestamp: Option<Instant>,
    /// Human-readable description of the last error encountered.
    last_error: Option<String>,
}

impl StatsCache {
    /// Create a cache around `facade` with the given TTL.
    pub fn new(facade: UsageQueryFacade, cache_ttl: Duration) -> Self {
        Self {
            facade,
            cache_ttl,
            cache: None,
            cache_timestamp: None,
            last_error: None,
        }
    }

    /// Create a cache with the default TTL of [`DEFAULT_CACHE_TTL_SECS`].
    pub fn with_default_ttl(facade: UsageQueryFacade) -> Self {
        Self::new(facade, Duration::from_secs(DEFAULT_CACHE_TTL_SECS))
    }

    // ── Public API ────────────────────────────────────────────────────────

    /// Return statistics, using the cache when it is still valid.
    ///
    /// When `force_refresh` is `true` the cache is bypassed and a fresh
    /// fetch is always attempted. On fetch failure the previous cache (if
    /// any) is returned as a best-effort fallback.
    ///
    /// The fetch is retried up to [`MAX_RETRY_ATTEMPTS`] times with
    /// back-off (0 ms → 100 ms → 200 ms).
    pub fn get(&mut self, force_refresh: bool) -> Option<&UsageStatistics> {
        if !force_refresh && self.is_cache_valid() {
            tracing::debug!("returning cached statistics");
            return self.cache.as_ref();
        }

        match self.fetch_with_retry() {
            Ok(stats) => {
                tracing::debug!(
                    sessions = stats.totals.session_count,
                    total_tokens = stats.totals.total_tokens,
                    "statistics cache updated"
                );
                self.cache = Some(stats);
                self.cache_timestamp = Some(Instant::now());
                self.last_error = None;
                self.cache.as_ref()
            }
            Err(e) => {
                tracing::warn!(error = %e, "fetch failed; falling back to cached statistics");
                self.last_error = Some(e);
                // Return whatever we have, even if stale.
                self.cache.as_ref()
            }
        }
    }

    /// Discard the current cache, forcing the next [`StatsCache::get`] call
    /// to fetch.
    pub fn invalidate(&mut self) {
        self.cache = None;
        self.cache_timestamp = None;
        tracing::debug!("cache invalidated");
    }

    /// Age of the current cache entry, or `None` if nothing has been fetched.
    pub fn cache_age(&self) -> Option<Duration> {
        self.cache_timestamp.map(|ts| ts.elapsed())
    }

    /// Human-readable description of the last fetch error, or `None`.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// The wrapped facade, e.g. for registering pricing overrides.
    pub fn facade_mut(&mut self) -> &mut UsageQueryFacade {
        &mut self.facade
    }

    // ── Private helpers ───────────────────────────────────────────────────

    /// `true` when the cache holds statistics still within their TTL.
    fn is_cache_valid(&self) -> bool {
        match (self.cache.as_ref(), self.cache_timestamp) {
            (Some(_), Some(ts)) => ts.elapsed() < self.cache_ttl,
            _ => false,
        }
    }

    /// Attempt up to [`MAX_RETRY_ATTEMPTS`] fetches with back-off.
    ///
    /// An empty log root short-circuits to zeroed statistics; retrying
    /// cannot conjure data that is not on disk.
    fn fetch_with_retry(&mut self) -> Result<UsageStatistics, String> {
        let mut last_err = String::new();

        for attempt in 0..MAX_RETRY_ATTEMPTS {
            // Back-off schedule: 0, 100, 200 ms.
            if attempt > 0 {
                let sleep_ms = (attempt as u64) * 100;
                tracing::debug!(attempt, sleep_ms, "retrying fetch after back-off");
                thread::sleep(Duration::from_millis(sleep_ms));
            }

            match self.facade.usage_statistics() {
                Ok(stats) => return Ok(stats),
                Err(LedgerError::NoUsageData) => {
                    tracing::debug!("no usage data on disk; caching empty statistics");
                    return Ok(UsageStatistics::default());
                }
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "fetch attempt failed");
                    last_err = e.to_string();
                }
            }
        }

        Err(last_err)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
