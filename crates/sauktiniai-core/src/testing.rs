//! Scripted in-memory `WindowSource` for tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::api::{ApiError, WindowSource};
use crate::models::{Person, Region};

pub fn person(pos: u32, name: &str, lastname: &str, number: &str, bdate: &str) -> Person {
    Person {
        pos: pos.to_string(),
        number: number.to_string(),
        name: name.to_string(),
        lastname: lastname.to_string(),
        bdate: bdate.to_string(),
        department: String::new(),
        info: String::new(),
    }
}

/// Serves a fixed dataset per region, honouring inclusive windows, and
/// records every call it sees.
#[derive(Default)]
pub struct ScriptedSource {
    data: Vec<(Region, Vec<Person>)>,
    failing_starts: HashSet<u32>,
    delay: Option<Duration>,
    /// Windows with a lower start sleep longer, so completion order is the
    /// reverse of offset order.
    reverse_completion: bool,
    calls: Mutex<Vec<(Region, u32, u32)>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_region(mut self, region: Region, persons: Vec<Person>) -> Self {
        self.data.push((region, persons));
        self
    }

    /// Generate `count` sequential records for a region, `pos` equal to the offset.
    pub fn with_generated(self, region: Region, count: u32) -> Self {
        let persons = (0..count)
            .map(|i| person(i, "Vardas", "Pavarde", &format!("N{}", i), "2000"))
            .collect();
        self.with_region(region, persons)
    }

    pub fn failing_at(mut self, start: u32) -> Self {
        self.failing_starts.insert(start);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn reverse_completion(mut self) -> Self {
        self.reverse_completion = true;
        self
    }

    pub fn calls(&self) -> Vec<(Region, u32, u32)> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WindowSource for ScriptedSource {
    async fn fetch_window(
        &self,
        region: Region,
        start: u32,
        end: u32,
    ) -> Result<Vec<Person>, ApiError> {
        self.calls.lock().push((region, start, end));
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            let delay = if self.reverse_completion {
                delay + Duration::from_millis(u64::from(10_000u32.saturating_sub(start) / 500) * 5)
            } else {
                delay
            };
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing_starts.contains(&start) {
            return Err(ApiError::Timeout(Duration::from_secs(30)));
        }

        let persons = self
            .data
            .iter()
            .find(|(r, _)| *r == region)
            .map(|(_, persons)| {
                persons
                    .iter()
                    .skip(start as usize)
                    .take((end - start + 1) as usize)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(persons)
    }
}
