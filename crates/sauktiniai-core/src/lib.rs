//! Core library for sauktiniai.
//!
//! Mirrors the upstream conscript roster into memory and answers list and
//! search queries against it. The upstream service only hands out small item
//! windows, so a region is read as many windowed requests run in parallel
//! under a fixed ceiling, then cached per region so it is fetched only once.
//!
//! - `api`: upstream HTTP client and the `WindowSource` seam
//! - `fetch`: window planning and the bounded concurrent aggregator
//! - `cache`: per-region single-flight cache and on-disk snapshots
//! - `query`: paginated listing and search
//!
//! Completeness is best effort. A window that fails is dropped, not retried,
//! and plain data accessors do not say so. Use `Aggregator::fetch_report` or
//! `RegionCache::summary` to find out how many windows went missing.

pub mod api;
pub mod cache;
pub mod config;
pub mod fetch;
pub mod models;
pub mod query;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{ApiError, UpstreamClient, WindowSource};
pub use cache::{LoadSummary, RegionCache, SnapshotStore};
pub use config::Config;
pub use fetch::{Aggregator, FetchReport};
pub use models::{ListResponse, Person, Region, SearchResponse};
pub use query::{QueryEngine, QueryError};
