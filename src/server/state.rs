use crate::location::{GeoCoordinate, Geolocator};
use crate::oracle::PlaceOracle;
use crate::places::PlaceRecord;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Searches kept so re-sorting and re-filtering don't hit the oracle again.
pub const RESULT_CACHE_CAPACITY: usize = 64;

pub struct AppState {
    pub oracle: Arc<dyn PlaceOracle>,
    pub geolocator: Option<Arc<dyn Geolocator>>,
    pub results: Mutex<ResultCache>,
}

impl AppState {
    pub fn new(oracle: Arc<dyn PlaceOracle>, geolocator: Option<Arc<dyn Geolocator>>) -> Self {
        Self {
            oracle,
            geolocator,
            results: Mutex::new(ResultCache::new(RESULT_CACHE_CAPACITY)),
        }
    }

    /// The cache holds plain data, so a poisoned lock is still usable.
    pub fn results(&self) -> MutexGuard<'_, ResultCache> {
        self.results.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Bounded FIFO of de-duplicated oracle records keyed by (query, position).
///
/// Distances are not stored: the key is rounded, so each request attaches
/// its own from the exact coordinate it sent.
pub struct ResultCache {
    capacity: usize,
    entries: VecDeque<(String, Vec<PlaceRecord>)>,
}

impl ResultCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: VecDeque::new(),
        }
    }

    /// Case-insensitive query plus the position rounded to ~11 m.
    pub fn key(query: &str, at: GeoCoordinate) -> String {
        format!("{}|{:.4},{:.4}", query.trim().to_lowercase(), at.lat, at.lng)
    }

    pub fn get(&self, key: &str) -> Option<Vec<PlaceRecord>> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    pub fn put(&mut self, key: String, records: Vec<PlaceRecord>) {
        self.entries.retain(|(k, _)| *k != key);
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back((key, records));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
