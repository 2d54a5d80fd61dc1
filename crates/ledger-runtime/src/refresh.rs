//! Async periodic statistics refresh.
//!
//! Runs [`UsageQueryFacade::usage_statistics`] in a tokio task on a fixed
//! interval, sending [`StatsSnapshot`]s through an `mpsc` channel so a
//! consumer loop can re-render without any shared mutable state.

use std::time::Duration;

use chrono::Utc;
use ledger_core::error::LedgerError;
use ledger_core::models::UsageStatistics;
use ledger_data::query::UsageQueryFacade;
use tokio::sync::mpsc;
use tokio::time;

// ── Public types ──────────────────────────────────────────────────────────────

/// Default seconds between refresh passes.
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 60;

/// Result of one refresh pass.
#[derive(Debug, Clone)]
pub enum RefreshOutcome {
    /// Fresh statistics were computed.
    Updated(UsageStatistics),
    /// The log root holds no usage data yet.
    Empty,
    /// The refresh failed; the message describes the cause.
    Failed(String),
}

/// A single statistics snapshot forwarded to the consumer.
///
/// This is the primary data contract between the background refresh task and
/// whatever renders or records the statistics.
#[derive(Debug, Clone)]
pub struct StatsSnapshot {
    /// What this refresh pass produced.
    pub outcome: RefreshOutcome,
    /// ISO-8601 timestamp of when the snapshot was generated.
    pub generated_at: String,
}

// ── RefreshService ────────────────────────────────────────────────────────────

/// Background statistics refresher.
///
/// Call [`RefreshService::start`] to spin up the refresh loop in a dedicated
/// tokio task and receive a channel endpoint for [`StatsSnapshot`] updates.
pub struct RefreshService {
    /// The query facade every refresh goes through.
    facade: UsageQueryFacade,
    /// How often to recompute statistics.
    interval: Duration,
}

impl RefreshService {
    /// Create a service refreshing every `interval`.
    pub fn new(facade: UsageQueryFacade, interval: Duration) -> Self {
        Self { facade, interval }
    }

    /// Create a service with [`DEFAULT_REFRESH_INTERVAL_SECS`].
    pub fn with_default_interval(facade: UsageQueryFacade) -> Self {
        Self::new(facade, Duration::from_secs(DEFAULT_REFRESH_INTERVAL_SECS))
    }

    /// Start the refresh loop.
    ///
    /// Spawns a tokio task that refreshes immediately, then on every interval
    /// tick. Returns:
    /// - An `mpsc::Receiver<StatsSnapshot>` for the caller to poll.
    /// - A [`RefreshHandle`] that can be used to abort the loop.
    pub fn start(self) -> (mpsc::Receiver<StatsSnapshot>, RefreshHandle) {
        // Buffer a few snapshots so a slow consumer does not stall the loop.
        let (tx, rx) = mpsc::channel(16);

        let handle = tokio::spawn(async move {
            self.refresh_loop(tx).await;
        });

        (rx, RefreshHandle { handle })
    }

    // ── Private implementation ────────────────────────────────────────────

    /// The main refresh loop.
    ///
    /// Performs an immediate refresh on startup, then repeats on `interval`.
    /// The loop exits when the receiver side of the channel is closed.
    async fn refresh_loop(self, tx: mpsc::Sender<StatsSnapshot>) {
        self.refresh_and_send(&tx).await;

        let mut interval = time::interval(self.interval);
        // Consume the first tick which fires immediately; we already sent.
        interval.tick().await;

        loop {
            interval.tick().await;

            if tx.is_closed() {
                tracing::debug!("snapshot channel closed; exiting refresh loop");
                break;
            }

            self.refresh_and_send(&tx).await;
        }
    }

    /// Run one refresh pass and send the resulting snapshot.
    async fn refresh_and_send(&self, tx: &mpsc::Sender<StatsSnapshot>) {
        let snapshot = self.snapshot();

        match &snapshot.outcome {
            RefreshOutcome::Updated(stats) => tracing::debug!(
                sessions = stats.totals.session_count,
                total_tokens = stats.totals.total_tokens,
                "refresh produced updated statistics"
            ),
            RefreshOutcome::Empty => tracing::debug!("refresh found no usage data"),
            RefreshOutcome::Failed(msg) => tracing::warn!(error = %msg, "refresh failed"),
        }

        if let Err(e) = tx.send(snapshot).await {
            tracing::warn!(error = %e, "failed to send snapshot; receiver dropped");
        }
    }

    /// Compute one snapshot from the current on-disk state.
    fn snapshot(&self) -> StatsSnapshot {
        let outcome = match self.facade.usage_statistics() {
            Ok(stats) => RefreshOutcome::Updated(stats),
            Err(LedgerError::NoUsageData) => RefreshOutcome::Empty,
            Err(e) => RefreshOutcome::Failed(e.to_string()),
        };

        StatsSnapshot {
            outcome,
            generated_at: Utc::now().to_rfc3339(),
        }
    }
}

// ── RefreshHandle ─────────────────────────────────────────────────────────────

/// A handle to the background refresh task.
///
/// Drop the receiver or call [`RefreshHandle::abort`] to stop the loop.
pub struct RefreshHandle {
    handle: tokio::task::JoinHandle<()>,
}

impl RefreshHandle {
    /// Immediately abort the refresh loop.
    pub fn abort(&self) {
        self.handle.abort();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
