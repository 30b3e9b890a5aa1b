//! sauktiniai - mirror and query the conscript roster from the command line.
//!
//! `refresh` fetches every region from upstream and writes the snapshots the
//! server preloads at startup. The query commands run against those
//! snapshots, fetching from upstream only for regions that have none.

use std::io;
use std::sync::Arc;

use anyhow::{Context, Result};
use sauktiniai_core::{
    Aggregator, Config, QueryEngine, Region, RegionCache, SnapshotStore, UpstreamClient,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Prefix of the daily rolling log file in the data directory
const LOG_FILE_PREFIX: &str = "sauktiniai.log";

const USAGE: &str = "\
Usage: sauktiniai <command> [args]

Commands:
  refresh [region]                      Fetch regions from upstream and write snapshots
  list <region> [start] [limit] [year]  Print one page of a region
  search <region> <query>               Search a region by name, surname, number or birth year
  updated                               Print the date of the last refresh
  regions                               Print the region table

Regions are 1-6; anything else means 6 (Vilnius).";

/// Initialize the tracing subscriber for logging.
/// Returns the file writer guard, which must live until exit.
fn init_tracing(config: &Config) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = if config.log_to_file {
        let appender = tracing_appender::rolling::daily(config.data_dir(), LOG_FILE_PREFIX);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        (Some(fmt::layer().with_writer(writer).with_ansi(false)), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = Config::load()?;
    let _guard = init_tracing(&config);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let arg = |i: usize| args.get(i).map(String::as_str);

    match arg(0) {
        Some("refresh") => refresh(&config, arg(1)).await,
        Some("list") => {
            let region = Region::parse_or_default(arg(1).unwrap_or_default());
            let start = arg(2).and_then(|s| s.parse().ok()).unwrap_or(0);
            let limit = arg(3).and_then(|s| s.parse().ok()).unwrap_or(0);
            let engine = build_engine(&config)?;
            let page = engine.list(region, start, limit, arg(4)).await;
            print_json(&page)
        }
        Some("search") => {
            let region = Region::parse_or_default(arg(1).unwrap_or_default());
            let query = arg(2).unwrap_or_default();
            let engine = build_engine(&config)?;
            let result = engine.search(region, query).await?;
            print_json(&result)
        }
        Some("updated") => {
            let store = SnapshotStore::new(config.data_dir());
            println!("{}", store.last_updated().unwrap_or_else(|| "unknown".to_string()));
            Ok(())
        }
        Some("regions") => {
            let regions: Vec<_> = Region::ALL.iter().map(|r| r.info()).collect();
            print_json(&regions)
        }
        _ => {
            eprintln!("{}", USAGE);
            Ok(())
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn upstream(config: &Config) -> Result<Aggregator> {
    let client = UpstreamClient::new(config).context("Failed to build HTTP client")?;
    Ok(Aggregator::new(Arc::new(client), config))
}

/// Query engine over the snapshots in the data directory.
fn build_engine(config: &Config) -> Result<QueryEngine> {
    let cache = RegionCache::new(upstream(config)?, config.target_count);
    let store = SnapshotStore::new(config.data_dir());
    let loaded = store.preload_into(&cache);
    info!(loaded, dir = %store.dir().display(), "Snapshots loaded");
    Ok(QueryEngine::new(cache))
}

/// Fetch regions from upstream and write their snapshots.
///
/// Ctrl-C stops outstanding windows; a region cut short that way keeps its
/// previous snapshot, and the last-updated marker is left alone.
async fn refresh(config: &Config, only: Option<&str>) -> Result<()> {
    let regions: Vec<Region> = match only {
        Some(raw) => vec![raw.parse().context("Invalid region")?],
        None => Region::ALL.to_vec(),
    };

    let aggregator = upstream(config)?;
    let store = SnapshotStore::new(config.data_dir());

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping refresh");
            on_interrupt.cancel();
        }
    });

    let mut summaries = Vec::new();
    let mut written = 0;
    for region in regions {
        eprintln!("Fetching region {}...", region);
        let report = aggregator.fetch_report(region, config.target_count, &cancel).await;
        eprintln!("Region {}: {} records", region.id(), report.persons.len());

        let saved = store.save_report(region, &report)?;
        if report.cancelled > 0 {
            break;
        }
        if saved {
            written += 1;
        }

        summaries.push(serde_json::json!({
            "region": region.info(),
            "count": report.persons.len(),
            "windows": report.windows,
            "failed": report.failed,
            "saved": saved,
        }));
    }

    if cancel.is_cancelled() {
        anyhow::bail!("Refresh interrupted");
    }

    if written > 0 {
        store.touch_last_updated()?;
    } else {
        error!("No region snapshot was written, last-updated marker left alone");
    }
    print_json(&summaries)
}
