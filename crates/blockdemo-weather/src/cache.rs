//! In-memory cache keyed by city code.
//!
//! The cache never expires anything on its own: callers decide freshness
//! with [`CacheEntry::is_fresh`] at read time. Entries are replaced, never
//! mutated.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::types::WeatherRecord;

/// Client-side cache of validated records.
pub type WeatherCache = TtlCache<Arc<WeatherRecord>>;

#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    key: String,
    value: V,
    fetched_at: Instant,
}

impl<V> CacheEntry<V> {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn fetched_at(&self) -> Instant {
        self.fetched_at
    }

    /// Age at `now`; zero if `now` predates the fetch.
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.fetched_at)
    }

    /// `now - fetched_at < ttl`
    pub fn is_fresh(&self, ttl: Duration, now: Instant) -> bool {
        self.age(now) < ttl
    }
}

#[derive(Debug)]
pub struct TtlCache<V> {
    entries: HashMap<String, CacheEntry<V>>,
}

impl<V> Default for TtlCache<V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<V> TtlCache<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pure lookup, stale entries included.
    pub fn get(&self, key: &str) -> Option<&CacheEntry<V>> {
        self.entries.get(key)
    }

    /// Insert or replace the entry for `key`, returning the one it displaced.
    pub fn put(&mut self, key: impl Into<String>, value: V, fetched_at: Instant) -> Option<CacheEntry<V>> {
        let key = key.into();
        let entry = CacheEntry {
            key: key.clone(),
            value,
            fetched_at,
        };
        self.entries.insert(key, entry)
    }

    pub fn delete(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
