//! Bounded response cache with first-in-first-out eviction
//!
//! Entries are evicted strictly in insertion order. Reads never promote an
//! entry and overwriting a key keeps its original slot, so this is a FIFO
//! cache, not an LRU.

use parking_lot::RwLock;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};

use super::key::CacheKey;
use crate::types::CachedResponse;

/// Entries and their insertion order, guarded together
#[derive(Default)]
struct CacheInner {
    entries: HashMap<CacheKey, CachedResponse>,
    /// Keys oldest first; always holds exactly the keys of `entries`
    order: VecDeque<CacheKey>,
}

/// Shared answer cache, bounded by entry count
pub struct ResponseCache {
    inner: RwLock<CacheInner>,
    max_entries: usize,
}

impl ResponseCache {
    /// Create an empty cache
    ///
    /// `max_entries` is clamped to at least 1.
    pub fn new(max_entries: usize) -> Self {
        Self {
            inner: RwLock::new(CacheInner::default()),
            max_entries: max_entries.max(1),
        }
    }

    /// Look up a stored response
    pub fn get(&self, key: &CacheKey) -> Option<CachedResponse> {
        self.inner.read().entries.get(key).cloned()
    }

    /// Insert or overwrite an entry
    ///
    /// A new key arriving at a full cache first evicts the oldest surviving
    /// entry. Overwriting keeps the key's position in the eviction order.
    pub fn put(&self, key: CacheKey, value: CachedResponse) {
        let mut inner = self.inner.write();

        if let Some(existing) = inner.entries.get_mut(&key) {
            *existing = value;
            tracing::debug!("Cache entry overwritten: {}", key.short());
            return;
        }

        if inner.entries.len() >= self.max_entries {
            if let Some(oldest) = inner.order.pop_front() {
                inner.entries.remove(&oldest);
                tracing::debug!("Evicted oldest cache entry: {}", oldest.short());
            }
        }

        tracing::debug!("Cached response: {}", key.short());
        inner.order.push_back(key.clone());
        inner.entries.insert(key, value);
    }

    /// Remove every entry
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.entries.clear();
        inner.order.clear();
    }

    /// Current number of entries
    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of entries
    pub fn capacity(&self) -> usize {
        self.max_entries
    }

    /// Size and capacity, as reported by `GET /cache/stats`
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            cache_size: self.len(),
            max_cache_size: self.max_entries,
        }
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(100)
    }
}

/// Cache statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub cache_size: usize,
    pub max_cache_size: usize,
}
