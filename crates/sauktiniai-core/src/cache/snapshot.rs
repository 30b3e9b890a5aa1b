use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use tracing::{debug, info, warn};

use crate::fetch::FetchReport;
use crate::models::{Person, Region};

use super::RegionCache;

/// Marker file holding the date of the last full refresh
const LAST_UPDATED_FILE: &str = "last_updated.txt";

/// Per-region snapshots on disk: one JSON array of persons per region
/// (`region_<id>.json`) plus a `last_updated.txt` marker.
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn region_path(&self, region: Region) -> PathBuf {
        self.dir.join(format!("region_{}.json", region.id()))
    }

    /// Load a region snapshot. `Ok(None)` when there is none, `Err` when it is unreadable.
    pub fn load_region(&self, region: Region) -> Result<Option<Vec<Person>>> {
        let path = self.region_path(region);
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read snapshot: {}", path.display()))?;

        let persons: Vec<Person> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse snapshot: {}", path.display()))?;

        Ok(Some(persons))
    }

    pub fn save_region(&self, region: Region, persons: &[Person]) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create data directory: {}", self.dir.display()))?;

        // Write then rename so a reader never picks up half a file
        let path = self.region_path(region);
        let tmp = path.with_extension("json.tmp");
        let contents = serde_json::to_string(persons)?;
        std::fs::write(&tmp, contents)
            .with_context(|| format!("Failed to write snapshot: {}", tmp.display()))?;
        std::fs::rename(&tmp, &path)
            .with_context(|| format!("Failed to move snapshot into place: {}", path.display()))?;

        debug!(region = region.id(), count = persons.len(), path = %path.display(), "Snapshot saved");
        Ok(())
    }

    /// Persist the outcome of a region refresh.
    ///
    /// An empty result never replaces a snapshot that has records: either
    /// windows failed, or upstream answered every window with nothing (a
    /// blocked client looks exactly like that). A cancelled refresh is never
    /// written. Returns whether the snapshot was written.
    pub fn save_report(&self, region: Region, report: &FetchReport) -> Result<bool> {
        if report.cancelled > 0 {
            warn!(region = region.id(), "Refresh cancelled, snapshot not written");
            return Ok(false);
        }

        if report.persons.is_empty() {
            if !report.failed.is_empty() {
                warn!(region = region.id(), failed = report.failed.len(), "No records fetched, keeping previous snapshot");
                return Ok(false);
            }
            let previous = match self.load_region(region) {
                Ok(Some(persons)) => persons.len(),
                _ => 0,
            };
            if previous > 0 {
                warn!(region = region.id(), previous, "Upstream returned no records, keeping previous snapshot");
                return Ok(false);
            }
        }

        self.save_region(region, &report.persons)?;
        Ok(true)
    }

    /// The last-updated marker, trimmed. `None` if missing or blank.
    pub fn last_updated(&self) -> Option<String> {
        let contents = std::fs::read_to_string(self.dir.join(LAST_UPDATED_FILE)).ok()?;
        let trimmed = contents.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }

    pub fn write_last_updated(&self, date: NaiveDate) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(
            self.dir.join(LAST_UPDATED_FILE),
            date.format("%Y-%m-%d").to_string(),
        )?;
        Ok(())
    }

    pub fn touch_last_updated(&self) -> Result<()> {
        self.write_last_updated(Local::now().date_naive())
    }

    /// Fill every absent region of `cache` from its snapshot.
    ///
    /// Missing or corrupt snapshots are skipped and the region stays absent.
    /// Returns the number of regions loaded.
    pub fn preload_into(&self, cache: &RegionCache) -> usize {
        let mut loaded = 0;
        for region in Region::ALL {
            match self.load_region(region) {
                Ok(Some(persons)) => {
                    let count = persons.len();
                    if cache.preload(region, persons) {
                        info!(region = region.id(), count, "Region loaded from snapshot");
                        loaded += 1;
                    }
                }
                Ok(None) => debug!(region = region.id(), "No snapshot for region"),
                Err(e) => warn!(region = region.id(), error = %e, "Skipping unreadable snapshot"),
            }
        }
        loaded
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tempfile::{tempdir, TempDir};

    use super::*;
    use crate::fetch::{Aggregator, FailedWindow, Window};
    use crate::testing::{person, ScriptedSource};

    /// Store rooted in a not-yet-created directory under a fresh temp dir.
    /// Keep the `TempDir` alive for the duration of the test.
    fn temp_store() -> (SnapshotStore, TempDir) {
        let temp_dir = tempdir().unwrap();
        let store = SnapshotStore::new(temp_dir.path().join("data"));
        (store, temp_dir)
    }

    fn report(persons: Vec<Person>, failed: usize, cancelled: usize) -> FetchReport {
        let failed = (0..failed)
            .map(|i| FailedWindow {
                window: Window { index: i, start: i as u32 * 500, end: i as u32 * 500 + 499 },
                reason: "Request timed out after 30s".to_string(),
            })
            .collect();
        FetchReport { persons, windows: 12, failed, cancelled }
    }

    fn empty_cache() -> RegionCache {
        RegionCache::new(Aggregator::with_limits(Arc::new(ScriptedSource::new()), 500, 10), 6000)
    }

    #[test]
    fn test_save_and_load_region() {
        let (store, _temp_dir) = temp_store();
        let persons = vec![
            person(1, "Jonas", "Jonaitis", "A1", "2003"),
            person(2, "Petras", "Petraitis", "A2", "2004"),
        ];
        store.save_region(Region::Kaunas, &persons).unwrap();

        let loaded = store.load_region(Region::Kaunas).unwrap().unwrap();
        assert_eq!(loaded, persons);
        assert!(store.load_region(Region::Alytus).unwrap().is_none());
        assert!(!store.dir().join("region_2.json.tmp").exists());
    }

    #[test]
    fn test_corrupt_snapshot_is_error() {
        let (store, _temp_dir) = temp_store();
        std::fs::create_dir_all(store.dir()).unwrap();
        std::fs::write(store.dir().join("region_3.json"), "{not json").unwrap();

        assert!(store.load_region(Region::Klaipeda).is_err());
    }

    #[test]
    fn test_last_updated_marker() {
        let (store, _temp_dir) = temp_store();
        assert_eq!(store.last_updated(), None);

        let date = NaiveDate::from_ymd_opt(2025, 10, 3).unwrap();
        store.write_last_updated(date).unwrap();
        assert_eq!(store.last_updated().as_deref(), Some("2025-10-03"));

        std::fs::write(store.dir().join(LAST_UPDATED_FILE), "2025-11-01\n").unwrap();
        assert_eq!(store.last_updated().as_deref(), Some("2025-11-01"));
    }

    #[test]
    fn test_preload_skips_missing_and_corrupt() {
        let (store, _temp_dir) = temp_store();
        store
            .save_region(Region::Vilnius, &[person(1, "Ona", "Onaite", "B1", "2002")])
            .unwrap();
        store.save_region(Region::Alytus, &[]).unwrap();
        std::fs::write(store.dir().join("region_4.json"), "garbage").unwrap();

        let cache = empty_cache();
        let loaded = store.preload_into(&cache);

        assert_eq!(loaded, 2);
        assert!(cache.is_cached(Region::Vilnius));
        assert!(cache.is_cached(Region::Alytus));
        assert!(!cache.is_cached(Region::Panevezys));
        assert!(!cache.is_cached(Region::Kaunas));
        assert_eq!(cache.get_cached(Region::Vilnius).len(), 1);
    }

    #[test]
    fn test_save_report_writes_records() {
        let (store, _temp_dir) = temp_store();
        let fetched = report(vec![person(1, "Jonas", "Jonaitis", "A1", "2003")], 1, 0);

        // A partial refresh with records is still written
        assert!(store.save_report(Region::Kaunas, &fetched).unwrap());
        assert_eq!(store.load_region(Region::Kaunas).unwrap().unwrap().len(), 1);
    }

    #[test]
    fn test_save_report_keeps_snapshot_on_empty_result() {
        let (store, _temp_dir) = temp_store();
        let previous = vec![
            person(1, "Jonas", "Jonaitis", "A1", "2003"),
            person(2, "Petras", "Petraitis", "A2", "2004"),
        ];
        store.save_region(Region::Vilnius, &previous).unwrap();

        // Every window failed
        assert!(!store.save_report(Region::Vilnius, &report(vec![], 12, 0)).unwrap());
        // Every window answered, but with nothing
        assert!(!store.save_report(Region::Vilnius, &report(vec![], 0, 0)).unwrap());

        assert_eq!(store.load_region(Region::Vilnius).unwrap().unwrap(), previous);
    }

    #[test]
    fn test_save_report_empty_region_without_snapshot() {
        let (store, _temp_dir) = temp_store();

        assert!(store.save_report(Region::Alytus, &report(vec![], 0, 0)).unwrap());
        assert_eq!(store.load_region(Region::Alytus).unwrap(), Some(vec![]));

        // Nothing to keep, but failures still do not write an empty snapshot
        assert!(!store.save_report(Region::Siauliai, &report(vec![], 3, 0)).unwrap());
        assert!(store.load_region(Region::Siauliai).unwrap().is_none());
    }

    #[test]
    fn test_save_report_skips_cancelled_refresh() {
        let (store, _temp_dir) = temp_store();
        let partial = report(vec![person(1, "Ona", "Onaite", "B1", "2002")], 0, 4);

        assert!(!store.save_report(Region::Panevezys, &partial).unwrap());
        assert!(store.load_region(Region::Panevezys).unwrap().is_none());
    }
}
