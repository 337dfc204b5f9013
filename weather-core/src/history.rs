//! Bounded newest-first search history.
//!
//! [`RecencyLog`] is the server-side log: every search is prepended, nothing
//! is deduplicated. [`LocalHistory`] is the client cache: one entry per city,
//! persisted wholesale through a [`KeyValueStore`].

use std::collections::{HashSet, VecDeque};

use chrono::Utc;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::{
    error::HistoryError,
    local_store::KeyValueStore,
    model::{NewSearch, SearchHistoryEntry},
};

pub const SERVER_HISTORY_LIMIT: usize = 10;
pub const LOCAL_HISTORY_LIMIT: usize = 10;
pub const MERGED_HISTORY_LIMIT: usize = 20;

/// Storage key of the client cache.
pub const LOCAL_HISTORY_KEY: &str = "weather-search-history";

/// In-memory recency log shared between request handlers.
#[derive(Debug)]
pub struct RecencyLog {
    capacity: usize,
    entries: Mutex<VecDeque<SearchHistoryEntry>>,
}

impl Default for RecencyLog {
    fn default() -> Self {
        Self::new(SERVER_HISTORY_LIMIT)
    }
}

impl RecencyLog {
    pub fn new(capacity: usize) -> Self {
        Self { capacity, entries: Mutex::new(VecDeque::with_capacity(capacity + 1)) }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Timestamp, prepend, evict the oldest entries beyond capacity.
    pub fn append(&self, search: NewSearch) -> SearchHistoryEntry {
        let entry = SearchHistoryEntry::new(search, Utc::now());

        let mut entries = self.entries.lock();
        entries.push_front(entry.clone());
        entries.truncate(self.capacity);
        debug!(city = %entry.city, len = entries.len(), "search logged");

        entry
    }

    pub fn list(&self) -> Vec<SearchHistoryEntry> {
        self.entries.lock().iter().cloned().collect()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

/// Client cache of recent searches, deduplicated by city.
#[derive(Debug)]
pub struct LocalHistory<S> {
    store: S,
    limit: usize,
}

impl<S: KeyValueStore> LocalHistory<S> {
    pub fn new(store: S) -> Self {
        Self { store, limit: LOCAL_HISTORY_LIMIT }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Stored entries, newest first. Unreadable or malformed state is
    /// reported and replaced by an empty history.
    pub fn entries(&self) -> Vec<SearchHistoryEntry> {
        match self.load() {
            Ok(entries) => entries,
            Err(err) => {
                warn!("{err}; using empty search history");
                Vec::new()
            }
        }
    }

    fn load(&self) -> Result<Vec<SearchHistoryEntry>, HistoryError> {
        match self.store.get(LOCAL_HISTORY_KEY)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    /// Record a search: drop any earlier entry for the same city, prepend,
    /// truncate and write the whole list back.
    pub fn record(&self, search: NewSearch) -> Result<SearchHistoryEntry, HistoryError> {
        let entry = SearchHistoryEntry::new(search, Utc::now());

        let mut entries = self.entries();
        entries.retain(|e| e.city != entry.city);
        entries.insert(0, entry.clone());
        entries.truncate(self.limit);

        let encoded = serde_json::to_string(&entries)?;
        self.store.set(LOCAL_HISTORY_KEY, &encoded)?;

        Ok(entry)
    }

    pub fn clear(&self) -> Result<(), HistoryError> {
        self.store.remove(LOCAL_HISTORY_KEY)?;
        Ok(())
    }
}

/// Combine server and local history for display.
///
/// Remote entries come first and win over local entries for the same city;
/// the result is stably sorted newest first and cut to `limit`.
pub fn merge_remote_and_local(
    remote: &[SearchHistoryEntry],
    local: &[SearchHistoryEntry],
    limit: usize,
) -> Vec<SearchHistoryEntry> {
    let remote_cities: HashSet<&str> = remote.iter().map(|e| e.city.as_str()).collect();

    let mut merged: Vec<SearchHistoryEntry> = remote
        .iter()
        .chain(local.iter().filter(|e| !remote_cities.contains(e.city.as_str())))
        .cloned()
        .collect();

    merged.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    merged.truncate(limit);
    merged
}
