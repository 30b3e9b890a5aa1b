//! Listing and search over cached regions.

use tracing::{debug, warn};

use crate::cache::RegionCache;
use crate::models::{ListResponse, Person, Region, SearchResponse};

use super::QueryError;

/// Page size used when the requested limit is missing or out of range.
pub const DEFAULT_LIMIT: usize = 100;

/// Largest page a caller may ask for.
pub const MAX_LIMIT: usize = 1000;

/// A clamped offset/length slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub start: usize,
    pub limit: usize,
}

impl Page {
    /// Negative starts become 0; limits outside `1..=MAX_LIMIT` become `DEFAULT_LIMIT`.
    pub fn clamp(start: i64, limit: i64) -> Self {
        let start = usize::try_from(start).unwrap_or(0);
        let limit = match usize::try_from(limit) {
            Ok(limit) if (1..=MAX_LIMIT).contains(&limit) => limit,
            _ => DEFAULT_LIMIT,
        };
        Self { start, limit }
    }

    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let begin = self.start.min(items.len());
        let end = begin.saturating_add(self.limit).min(items.len());
        &items[begin..end]
    }
}

#[derive(Clone)]
pub struct QueryEngine {
    cache: RegionCache,
}

impl QueryEngine {
    pub fn new(cache: RegionCache) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &RegionCache {
        &self.cache
    }

    pub fn is_cached(&self, region: Region) -> bool {
        self.cache.is_cached(region)
    }

    pub fn get_cached(&self, region: Region) -> Vec<Person> {
        self.cache.get_cached(region).to_vec()
    }

    /// One page of a region, optionally only people born in `year`.
    ///
    /// A cached region is paged in memory and `total` counts the whole
    /// (filtered) region. An uncached region is not fetched in full: only the
    /// requested window is asked for, and `total` counts that window.
    pub async fn list(
        &self,
        region: Region,
        start: i64,
        limit: i64,
        year: Option<&str>,
    ) -> ListResponse {
        let page = Page::clamp(start, limit);
        let year = year.filter(|y| !y.is_empty());

        let (persons, total) = if self.cache.is_cached(region) {
            let all = self.cache.get_cached(region);
            page_of(&all, page, year)
        } else {
            let window = self.fetch_page(region, page).await;
            let filtered: Vec<Person> = match year {
                Some(year) => window.into_iter().filter(|p| p.born_in(year)).collect(),
                None => window,
            };
            let total = filtered.len();
            (filtered, total)
        };

        ListResponse {
            region,
            start: page.start,
            count: persons.len(),
            total,
            persons,
        }
    }

    async fn fetch_page(&self, region: Region, page: Page) -> Vec<Person> {
        let Ok(start) = u32::try_from(page.start) else {
            return Vec::new();
        };
        let end = start.saturating_add(page.limit as u32 - 1);

        debug!(region = region.id(), start, end, "Region not cached, fetching single page");
        match self
            .cache
            .aggregator()
            .source()
            .fetch_window(region, start, end)
            .await
        {
            Ok(persons) => persons,
            Err(e) => {
                warn!(region = region.id(), start, end, error = %e, "Page fetch failed");
                Vec::new()
            }
        }
    }

    /// Everyone in the region whose name, surname, number or birth year
    /// contains `query`. Names compare case-insensitively.
    ///
    /// Loads the whole region first if it is not cached.
    pub async fn search(&self, region: Region, query: &str) -> Result<SearchResponse, QueryError> {
        if query.is_empty() {
            return Err(QueryError::EmptyQuery);
        }

        let all = self.cache.ensure_loaded(region).await;
        let needle = query.to_lowercase();
        let persons: Vec<Person> = all.iter().filter(|p| p.matches(&needle)).cloned().collect();

        debug!(region = region.id(), query, matches = persons.len(), "Search done");
        Ok(SearchResponse {
            query: query.to_string(),
            region,
            count: persons.len(),
            persons,
        })
    }
}

fn page_of(all: &[Person], page: Page, year: Option<&str>) -> (Vec<Person>, usize) {
    match year {
        Some(year) => {
            let filtered: Vec<&Person> = all.iter().filter(|p| p.born_in(year)).collect();
            let persons = page.slice(&filtered).iter().map(|p| (*p).clone()).collect();
            (persons, filtered.len())
        }
        None => (page.slice(all).to_vec(), all.len()),
    }
}

// ============================================================================
// Tests
// ============================================================================
