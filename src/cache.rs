use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

// ---------------------------------------------------------------------------
// Time-expiring cache keyed by source locator
// ---------------------------------------------------------------------------

struct Entry<V> {
    value: V,
    fetched_at: Instant,
}

/// Values fetched once per validity window.
///
/// The lock is held for the duration of a fetch, so concurrent callers for
/// the same window all observe the first caller's value. Failed fetches are
/// not cached.
pub struct TtlCache<K, V> {
    entries: Mutex<HashMap<K, Entry<V>>>,
}

impl<K, V> Default for TtlCache<K, V> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash + Clone, V: Clone> TtlCache<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached value for `key` if younger than `ttl`, otherwise
    /// call `fetch` and store its result.
    pub fn get_or_fetch<E, F>(&self, key: &K, ttl: Duration, fetch: F) -> Result<V, E>
    where
        F: FnOnce(&K) -> Result<V, E>,
    {
        self.get_or_fetch_at(key, ttl, Instant::now(), fetch)
    }

    fn get_or_fetch_at<E, F>(&self, key: &K, ttl: Duration, now: Instant, fetch: F) -> Result<V, E>
    where
        F: FnOnce(&K) -> Result<V, E>,
    {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(entry) = entries.get(key) {
            if now.saturating_duration_since(entry.fetched_at) < ttl {
                log::info!("Cache hit");
                return Ok(entry.value.clone());
            }
        }

        log::info!("Cache miss, fetching");
        let value = fetch(key)?;
        entries.insert(
            key.clone(),
            Entry {
                value: value.clone(),
                fetched_at: now,
            },
        );
        Ok(value)
    }

    /// Drop the entry for `key` so the next lookup refetches.
    pub fn invalidate(&self, key: &K) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}
