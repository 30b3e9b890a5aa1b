//! Region caching.
//!
//! This module provides:
//! - `RegionCache`: in-memory per-region records with single-flight loading
//! - `SnapshotStore`: per-region JSON snapshots on disk, used to fill the
//!   cache at startup and written by the refresh command
//!
//! Cached regions are never invalidated. Fresh data comes from a refresh
//! writing new snapshots and the process being restarted.

pub mod region_cache;
pub mod snapshot;

pub use region_cache::{CacheStatus, LoadOrigin, LoadSummary, RegionCache};
pub use snapshot::SnapshotStore;
