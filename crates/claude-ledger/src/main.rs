mod bootstrap;
mod report;

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::Parser;
use ledger_core::error::LedgerError;
use ledger_core::models::UsageStatistics;
use ledger_core::settings::Settings;
use ledger_core::time_utils::resolve_timezone;
use ledger_data::parser::ParsePolicy;
use ledger_data::query::UsageQueryFacade;
use ledger_runtime::refresh::{RefreshOutcome, RefreshService, StatsSnapshot};

/// Upper bound used when only `--since` is given; sorts after any real
/// ISO-8601 timestamp.
const OPEN_END: &str = "9999-12-31T23:59:59Z";

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::parse();

    bootstrap::setup_logging(settings.effective_log_level())?;

    tracing::info!("Claude Ledger v{} starting", env!("CARGO_PKG_VERSION"));

    let data_path = match settings
        .data_path
        .clone()
        .or_else(bootstrap::discover_data_path)
    {
        Some(path) => path,
        None => bail!(
            "no Claude Code log directory found; pass --data-path or create ~/.claude/projects"
        ),
    };
    tracing::info!("Reading usage logs from {}", data_path.display());

    let policy = if settings.strict {
        ParsePolicy::Strict
    } else {
        ParsePolicy::Lenient
    };
    let timezone = resolve_timezone(&settings.timezone);
    let facade = UsageQueryFacade::with_options(&data_path, policy, timezone);

    if settings.watch {
        run_watch(facade, &settings).await
    } else {
        run_once(&facade, &settings)
    }
}

// ── One-shot report ────────────────────────────────────────────────────────────

fn run_once(facade: &UsageQueryFacade, settings: &Settings) -> Result<()> {
    let stats = match selected_statistics(facade, settings) {
        Ok(stats) => stats,
        Err(LedgerError::NoUsageData) => {
            println!("{}", report::no_data_hint(facade.data_path()));
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    println!(
        "{}",
        report::render(&stats, &settings.view, settings.top as usize)
    );
    Ok(())
}

/// Pick the facade query matching the requested filters.
///
/// Month combines with project or model; the remaining filters apply on
/// their own. With no filters at all, the full statistics load runs and its
/// errors surface to the caller.
fn selected_statistics(
    facade: &UsageQueryFacade,
    settings: &Settings,
) -> ledger_core::error::Result<UsageStatistics> {
    if let Some(month) = settings.month.as_deref() {
        if let Some(project) = settings.project.as_deref() {
            return Ok(facade.statistics_for_project_month(project, month));
        }
        if let Some(model) = settings.model.as_deref() {
            return Ok(facade.statistics_for_model_month(model, month));
        }
        return Ok(facade.statistics_for_month(month));
    }
    if let Some(project) = settings.project.as_deref() {
        return Ok(facade.statistics_for_project(project));
    }
    if let Some(model) = settings.model.as_deref() {
        return Ok(facade.statistics_for_model(model));
    }
    if settings.since.is_some() || settings.until.is_some() {
        let start = settings.since.as_deref().unwrap_or("");
        let end = settings.until.as_deref().unwrap_or(OPEN_END);
        return Ok(facade.statistics_for_date_range(start, end));
    }
    facade.usage_statistics()
}

// ── Watch mode ─────────────────────────────────────────────────────────────────

async fn run_watch(facade: UsageQueryFacade, settings: &Settings) -> Result<()> {
    if settings.month.is_some()
        || settings.project.is_some()
        || settings.model.is_some()
        || settings.since.is_some()
        || settings.until.is_some()
    {
        tracing::warn!("filters are ignored in watch mode");
    }

    let data_path = facade.data_path().to_path_buf();
    let service = RefreshService::new(facade, Duration::from_secs(u64::from(settings.refresh_rate)));
    let (mut rx, handle) = service.start();

    loop {
        tokio::select! {
            snapshot = rx.recv() => {
                match snapshot {
                    Some(snapshot) => {
                        print_snapshot(&snapshot, &data_path, &settings.view, settings.top as usize);
                    }
                    None => {
                        tracing::debug!("refresh channel closed");
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Ctrl+C received; stopping watch");
                handle.abort();
                break;
            }
        }
    }

    Ok(())
}

fn print_snapshot(snapshot: &StatsSnapshot, data_path: &Path, view: &str, top: usize) {
    match &snapshot.outcome {
        RefreshOutcome::Updated(stats) => {
            println!("{}", report::render(stats, view, top));
            println!("\n[updated {}; Ctrl-C to exit]", snapshot.generated_at);
        }
        RefreshOutcome::Empty => {
            println!("{}", report::no_data_hint(data_path));
        }
        RefreshOutcome::Failed(message) => {
            eprintln!("Refresh failed: {message}");
        }
    }
}
