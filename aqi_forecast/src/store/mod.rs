//! Series Store: cached, atomically swappable snapshots of cleaned series
//!
//! A snapshot is built once by a [`SeriesSource`] and is read-only after it
//! is published. Refreshing swaps in a new `Arc`, so a forecast holding the
//! previous snapshot keeps reading consistent data.

pub mod sheet;

pub use sheet::{parse_sheet, CsvFileSource};

use crate::data::{Division, Series};
use crate::error::Result;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Cleaned per-division series as of one fetch
#[derive(Debug, Clone)]
pub struct SeriesSnapshot {
    series: HashMap<Division, Series>,
    fetched_at: DateTime<Utc>,
}

impl SeriesSnapshot {
    /// Snapshot stamped with the current time; empty series are dropped
    pub fn new(series: HashMap<Division, Series>) -> Self {
        Self {
            series: series.into_iter().filter(|(_, s)| !s.is_empty()).collect(),
            fetched_at: Utc::now(),
        }
    }

    pub fn get(&self, division: Division) -> Option<&Series> {
        self.series.get(&division)
    }

    /// Divisions with data, in canonical order
    pub fn divisions(&self) -> Vec<Division> {
        Division::ALL
            .iter()
            .copied()
            .filter(|division| self.series.contains_key(division))
            .collect()
    }

    pub fn total_observations(&self) -> usize {
        self.series.values().map(Series::len).sum()
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }
}

/// Something that can produce a fresh snapshot, e.g. a CSV export of the sheet
pub trait SeriesSource: Send + Sync + Debug {
    fn fetch(&self) -> Result<SeriesSnapshot>;
}

#[derive(Debug)]
struct Published {
    at: Instant,
    snapshot: Arc<SeriesSnapshot>,
}

/// Time-bounded cache over a [`SeriesSource`]
#[derive(Debug)]
pub struct SeriesStore {
    source: Box<dyn SeriesSource>,
    max_age: Duration,
    current: RwLock<Option<Published>>,
}

impl SeriesStore {
    pub fn new(source: Box<dyn SeriesSource>, max_age: Duration) -> Self {
        Self {
            source,
            max_age,
            current: RwLock::new(None),
        }
    }

    /// Current snapshot, refreshing first if none is published or it is stale
    pub fn snapshot(&self) -> Result<Arc<SeriesSnapshot>> {
        {
            let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(published) = guard.as_ref() {
                if published.at.elapsed() <= self.max_age {
                    return Ok(Arc::clone(&published.snapshot));
                }
            }
        }
        self.refresh()
    }

    /// Fetch from the source and publish the result
    ///
    /// On failure the previously published snapshot stays in place.
    pub fn refresh(&self) -> Result<Arc<SeriesSnapshot>> {
        let started = Instant::now();
        let snapshot = match self.source.fetch() {
            Ok(snapshot) => Arc::new(snapshot),
            Err(e) => {
                warn!(error = %e, "series refresh failed");
                return Err(e);
            }
        };
        info!(
            divisions = snapshot.divisions().len(),
            observations = snapshot.total_observations(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "series snapshot refreshed"
        );
        self.publish_arc(Arc::clone(&snapshot));
        Ok(snapshot)
    }

    /// Publish an externally built snapshot
    pub fn publish(&self, snapshot: SeriesSnapshot) {
        self.publish_arc(Arc::new(snapshot));
    }

    fn publish_arc(&self, snapshot: Arc<SeriesSnapshot>) {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(Published {
            at: Instant::now(),
            snapshot,
        });
    }

    /// Time since the current snapshot was published
    pub fn age(&self) -> Option<Duration> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        guard.as_ref().map(|published| published.at.elapsed())
    }

    /// True when nothing is published or the snapshot exceeds `max_age`
    pub fn is_stale(&self) -> bool {
        self.age().map_or(true, |age| age > self.max_age)
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Owned copy of a division's series from the current snapshot
    pub fn get_series(&self, division: Division) -> Result<Option<Series>> {
        Ok(self.snapshot()?.get(division).cloned())
    }
}
