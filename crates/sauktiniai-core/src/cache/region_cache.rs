//! In-memory per-region cache with single-flight loading.
//!
//! Each region has its own slot and its own lock, so a slow load of one
//! region never blocks reads of another. A slot moves absent -> loading ->
//! populated once. While it is loading, the slot holds a shared handle to the
//! in-flight load and every caller awaits that same handle; only the first
//! caller on an absent slot starts a fetch.
//!
//! The fetch runs in its own task and writes the populated slot itself, so it
//! finishes even if every caller that was waiting on it goes away. Readers
//! never see a partial list: the records become visible in one write, after
//! the whole region has been fetched.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::RwLock;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::fetch::Aggregator;
use crate::models::{Person, Region};

type PendingLoad = Shared<BoxFuture<'static, Arc<[Person]>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadOrigin {
    Snapshot,
    Upstream,
}

/// What is known about a populated region.
#[derive(Debug, Clone, Serialize)]
pub struct LoadSummary {
    pub region: Region,
    pub count: usize,
    /// Windows scheduled by the fetch; zero for snapshot loads.
    pub windows: usize,
    pub failed_windows: usize,
    pub origin: LoadOrigin,
    pub loaded_at: DateTime<Utc>,
}

impl LoadSummary {
    pub fn is_complete(&self) -> bool {
        self.failed_windows == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Absent,
    Loading,
    Populated,
}

enum SlotState {
    Absent,
    Loading(PendingLoad),
    Populated {
        persons: Arc<[Person]>,
        summary: LoadSummary,
    },
}

struct RegionSlot {
    state: RwLock<SlotState>,
}

enum Claim {
    Ready(Arc<[Person]>),
    Wait(PendingLoad),
}

struct Inner {
    slots: HashMap<Region, Arc<RegionSlot>>,
    aggregator: Aggregator,
    target_count: u32,
}

/// Per-region cache of fetched records.
/// Clone is cheap and clones share the same slots.
#[derive(Clone)]
pub struct RegionCache {
    inner: Arc<Inner>,
}

impl RegionCache {
    pub fn new(aggregator: Aggregator, target_count: u32) -> Self {
        let slots = Region::ALL
            .into_iter()
            .map(|region| {
                let slot = RegionSlot {
                    state: RwLock::new(SlotState::Absent),
                };
                (region, Arc::new(slot))
            })
            .collect();

        Self {
            inner: Arc::new(Inner {
                slots,
                aggregator,
                target_count,
            }),
        }
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.inner.aggregator
    }

    fn slot(&self, region: Region) -> &Arc<RegionSlot> {
        // Every region gets a slot in `new`
        &self.inner.slots[&region]
    }

    pub fn status(&self, region: Region) -> CacheStatus {
        match &*self.slot(region).state.read() {
            SlotState::Absent => CacheStatus::Absent,
            SlotState::Loading(_) => CacheStatus::Loading,
            SlotState::Populated { .. } => CacheStatus::Populated,
        }
    }

    pub fn is_cached(&self, region: Region) -> bool {
        self.status(region) == CacheStatus::Populated
    }

    /// Cached records, or an empty list while the region is absent or loading.
    pub fn get_cached(&self, region: Region) -> Arc<[Person]> {
        match &*self.slot(region).state.read() {
            SlotState::Populated { persons, .. } => Arc::clone(persons),
            _ => empty(),
        }
    }

    pub fn summary(&self, region: Region) -> Option<LoadSummary> {
        match &*self.slot(region).state.read() {
            SlotState::Populated { summary, .. } => Some(summary.clone()),
            _ => None,
        }
    }

    /// Populate an absent region directly, e.g. from a snapshot on disk.
    /// Returns false (and changes nothing) if the region is loading or populated.
    pub fn preload(&self, region: Region, persons: Vec<Person>) -> bool {
        let mut state = self.slot(region).state.write();
        if !matches!(*state, SlotState::Absent) {
            debug!(region = region.id(), "Region already present, skipping preload");
            return false;
        }

        let summary = LoadSummary {
            region,
            count: persons.len(),
            windows: 0,
            failed_windows: 0,
            origin: LoadOrigin::Snapshot,
            loaded_at: Utc::now(),
        };
        *state = SlotState::Populated {
            persons: Arc::from(persons),
            summary,
        };
        true
    }

    /// Return the region's records, fetching them first if needed.
    ///
    /// At most one fetch per region ever runs; concurrent callers all wait for
    /// it and get the same list.
    pub async fn ensure_loaded(&self, region: Region) -> Arc<[Person]> {
        match self.claim(region) {
            Claim::Ready(persons) => persons,
            Claim::Wait(pending) => pending.await,
        }
    }

    fn claim(&self, region: Region) -> Claim {
        let slot = self.slot(region);

        if let SlotState::Populated { persons, .. } = &*slot.state.read() {
            return Claim::Ready(Arc::clone(persons));
        }

        let mut state = slot.state.write();
        // Re-check: another caller may have got here between the two locks
        match &*state {
            SlotState::Populated { persons, .. } => return Claim::Ready(Arc::clone(persons)),
            SlotState::Loading(pending) => return Claim::Wait(pending.clone()),
            SlotState::Absent => {}
        }

        let pending = self.start_load(region, Arc::clone(slot));
        *state = SlotState::Loading(pending.clone());
        Claim::Wait(pending)
    }

    fn start_load(&self, region: Region, slot: Arc<RegionSlot>) -> PendingLoad {
        info!(region = region.id(), "Region not cached, starting fetch");

        let aggregator = self.inner.aggregator.clone();
        let target_count = self.inner.target_count;
        let writer = Arc::clone(&slot);

        let handle = tokio::spawn(async move {
            let report = aggregator
                .fetch_report(region, target_count, &CancellationToken::new())
                .await;

            let summary = LoadSummary {
                region,
                count: report.persons.len(),
                windows: report.windows,
                failed_windows: report.failed.len(),
                origin: LoadOrigin::Upstream,
                loaded_at: Utc::now(),
            };
            let persons: Arc<[Person]> = Arc::from(report.persons);

            *writer.state.write() = SlotState::Populated {
                persons: Arc::clone(&persons),
                summary,
            };
            debug!(region = region.id(), count = persons.len(), "Region cached");
            persons
        });

        async move {
            match handle.await {
                Ok(persons) => persons,
                Err(e) => {
                    // Let the next caller try again
                    error!(region = region.id(), error = %e, "Region fetch task failed");
                    *slot.state.write() = SlotState::Absent;
                    empty()
                }
            }
        }
        .boxed()
        .shared()
    }
}

fn empty() -> Arc<[Person]> {
    Arc::from(Vec::new())
}

// ============================================================================
// Tests
// ============================================================================
