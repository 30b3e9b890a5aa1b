//! Whole-region fetching over many small windows.
//!
//! Upstream only answers fixed-size item windows, so reading a region means
//! planning `ceil(target / window_size)` windows and requesting them all.
//! Each window runs as its own task; a semaphore keeps at most
//! `max_concurrent` of them talking to upstream at once.
//!
//! A window that fails is not retried and does not fail the region: its
//! records are simply missing from the result. `fetch_all` hides this, as
//! callers have always expected plain data. `fetch_report` exposes the
//! failed windows for callers that need to know how complete the data is.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::api::WindowSource;
use crate::config::Config;
use crate::models::{Person, Region};

use super::window::{plan_windows, Window};

/// Result of one window task.
#[derive(Debug)]
pub enum WindowOutcome {
    Fetched { window: Window, persons: Vec<Person> },
    Failed { window: Window, reason: String },
    Cancelled { window: Window },
}

impl WindowOutcome {
    pub fn window(&self) -> Window {
        match self {
            WindowOutcome::Fetched { window, .. }
            | WindowOutcome::Failed { window, .. }
            | WindowOutcome::Cancelled { window } => *window,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedWindow {
    pub window: Window,
    pub reason: String,
}

/// Everything one region fetch produced.
#[derive(Debug, Clone, Default)]
pub struct FetchReport {
    /// Records of all successful windows, in offset order.
    pub persons: Vec<Person>,
    /// Windows scheduled.
    pub windows: usize,
    pub failed: Vec<FailedWindow>,
    /// Windows abandoned because the fetch was cancelled.
    pub cancelled: usize,
}

impl FetchReport {
    /// True when every scheduled window answered.
    /// An empty window still counts as answered.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.cancelled == 0
    }

    fn from_outcomes(windows: &[Window], outcomes: Vec<WindowOutcome>) -> Self {
        let seen: HashSet<usize> = outcomes.iter().map(|o| o.window().index).collect();

        let mut fetched = Vec::new();
        let mut failed = Vec::new();
        let mut cancelled = 0;
        for outcome in outcomes {
            match outcome {
                WindowOutcome::Fetched { window, persons } => fetched.push((window, persons)),
                WindowOutcome::Failed { window, reason } => failed.push(FailedWindow { window, reason }),
                WindowOutcome::Cancelled { .. } => cancelled += 1,
            }
        }

        // A task that panicked never reported back
        for window in windows.iter().filter(|w| !seen.contains(&w.index)) {
            failed.push(FailedWindow {
                window: *window,
                reason: "window task aborted".to_string(),
            });
        }

        // Tasks finish in network order; put windows back in offset order.
        fetched.sort_by_key(|(window, _)| window.start);
        failed.sort_by_key(|f| f.window.start);

        let persons = fetched.into_iter().flat_map(|(_, persons)| persons).collect();

        Self {
            persons,
            windows: windows.len(),
            failed,
            cancelled,
        }
    }
}

/// Fetches entire regions through a `WindowSource`.
/// Clone is cheap - the source is shared.
#[derive(Clone)]
pub struct Aggregator {
    source: Arc<dyn WindowSource>,
    window_size: u32,
    max_concurrent: usize,
}

impl Aggregator {
    pub fn new(source: Arc<dyn WindowSource>, config: &Config) -> Self {
        Self::with_limits(source, config.window_size, config.max_concurrent_requests)
    }

    pub fn with_limits(source: Arc<dyn WindowSource>, window_size: u32, max_concurrent: usize) -> Self {
        Self {
            source,
            window_size: window_size.max(1),
            max_concurrent: max_concurrent.max(1),
        }
    }

    pub fn source(&self) -> &Arc<dyn WindowSource> {
        &self.source
    }

    /// Fetch every window of `[0, target_count)` and return the records of
    /// the windows that succeeded.
    pub async fn fetch_all(&self, region: Region, target_count: u32) -> Vec<Person> {
        self.fetch_report(region, target_count, &CancellationToken::new())
            .await
            .persons
    }

    /// Like `fetch_all`, but reports failed windows and stops outstanding
    /// work when `cancel` fires. Windows already answered are kept.
    pub async fn fetch_report(
        &self,
        region: Region,
        target_count: u32,
        cancel: &CancellationToken,
    ) -> FetchReport {
        let windows = plan_windows(target_count, self.window_size);
        info!(
            region = region.id(),
            target_count,
            windows = windows.len(),
            max_concurrent = self.max_concurrent,
            "Fetching region"
        );

        let permits = Arc::new(Semaphore::new(self.max_concurrent));
        let mut tasks = JoinSet::new();
        for window in windows.iter().copied() {
            let source = Arc::clone(&self.source);
            let permits = Arc::clone(&permits);
            let cancel = cancel.clone();
            tasks.spawn(async move { run_window(source, permits, cancel, region, window).await });
        }

        let mut outcomes = Vec::with_capacity(windows.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => error!(region = region.id(), error = %e, "Window task failed to complete"),
            }
        }

        let report = FetchReport::from_outcomes(&windows, outcomes);
        if report.is_complete() {
            info!(region = region.id(), count = report.persons.len(), "Region fetched");
        } else {
            warn!(
                region = region.id(),
                count = report.persons.len(),
                failed = report.failed.len(),
                cancelled = report.cancelled,
                "Region fetched with missing windows"
            );
        }
        report
    }
}

async fn run_window(
    source: Arc<dyn WindowSource>,
    permits: Arc<Semaphore>,
    cancel: CancellationToken,
    region: Region,
    window: Window,
) -> WindowOutcome {
    let _permit = tokio::select! {
        biased;
        _ = cancel.cancelled() => return WindowOutcome::Cancelled { window },
        permit = permits.acquire() => match permit {
            Ok(permit) => permit,
            Err(_) => return WindowOutcome::Cancelled { window },
        },
    };

    tokio::select! {
        biased;
        _ = cancel.cancelled() => WindowOutcome::Cancelled { window },
        result = source.fetch_window(region, window.start, window.end) => match result {
            Ok(persons) => {
                debug!(region = region.id(), window = %window, count = persons.len(), "Window done");
                WindowOutcome::Fetched { window, persons }
            }
            Err(e) => {
                warn!(region = region.id(), window = %window, error = %e, "Window failed, skipping");
                WindowOutcome::Failed { window, reason: e.to_string() }
            }
        },
    }
}

// ============================================================================
// Tests
// ============================================================================
