//! Cache Store Module
//!
//! Main cache engine combining a key index with an eviction-order list and
//! body-size accounting. Not synchronized itself; see [`SharedCache`].
//!
//! [`SharedCache`]: crate::cache::SharedCache

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::cache::{CacheEntry, CacheStats, Handle, OrderList};
use crate::error::CacheError;

// == Cache Store ==
/// Bounded response storage with oldest-first eviction.
///
/// Invariants, holding between any two calls:
/// - `total_size` equals the sum of every entry's body size
/// - `total_size <= max_cache_size`
/// - no entry is larger than `max_object_size`
/// - every key appears at most once
#[derive(Debug)]
pub struct CacheStore {
    /// Key to position in `order`
    index: HashMap<String, Handle>,
    /// Entries oldest-first
    order: OrderList<Arc<CacheEntry>>,
    /// Sum of body sizes
    total_size: usize,
    /// Capacity in body bytes
    max_cache_size: usize,
    /// Per-entry body limit
    max_object_size: usize,
    /// Insert/evict counters
    stats: CacheStats,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a new CacheStore.
    ///
    /// # Arguments
    /// * `max_cache_size` - Total body bytes the store may hold
    /// * `max_object_size` - Largest body a single entry may have
    pub fn new(max_cache_size: usize, max_object_size: usize) -> Self {
        Self {
            index: HashMap::new(),
            order: OrderList::new(),
            total_size: 0,
            max_cache_size,
            max_object_size,
            stats: CacheStats::new(),
        }
    }

    // == Get ==
    /// Looks up an entry without touching its position.
    pub fn get(&self, key: &str) -> Option<&Arc<CacheEntry>> {
        self.index.get(key).and_then(|&handle| self.order.get(handle))
    }

    // == Insert ==
    /// Adds an entry at the most recent end, evicting oldest entries until it fits.
    ///
    /// An entry already stored under the same key is replaced. Returns the
    /// number of entries evicted to make room.
    pub fn insert(&mut self, entry: CacheEntry) -> Result<usize, CacheError> {
        let size = entry.size();
        if size > self.max_object_size {
            return Err(CacheError::ObjectTooLarge {
                size,
                limit: self.max_object_size,
            });
        }
        if size == 0 {
            return Err(CacheError::EmptyObject(entry.key));
        }

        if let Some(handle) = self.index.remove(&entry.key) {
            if let Some(old) = self.order.remove(handle) {
                self.total_size -= old.size();
                debug!(key = %old.key, "Replacing cached entry");
            }
        }

        let mut evicted = 0;
        while self.total_size + size > self.max_cache_size {
            if self.evict_oldest().is_none() {
                break;
            }
            evicted += 1;
        }

        let key = entry.key.clone();
        let handle = self.order.push_back(Arc::new(entry));
        self.index.insert(key, handle);
        self.total_size += size;
        self.stats.record_insertion();

        Ok(evicted)
    }

    // == Promote ==
    /// Moves an entry to the most recent end.
    ///
    /// Only promotes when `key` still maps to this exact entry; if it was
    /// evicted or replaced in the meantime nothing happens and false is returned.
    pub fn promote(&mut self, key: &str, entry: &Arc<CacheEntry>) -> bool {
        match self.index.get(key) {
            Some(&handle) => match self.order.get(handle) {
                Some(current) if Arc::ptr_eq(current, entry) => self.order.move_to_back(handle),
                _ => false,
            },
            None => false,
        }
    }

    // == Evict Oldest ==
    /// Removes and returns the oldest entry.
    ///
    /// Returns None if the store is empty.
    pub fn evict_oldest(&mut self) -> Option<Arc<CacheEntry>> {
        let entry = self.order.pop_front()?;
        self.index.remove(&entry.key);
        self.total_size -= entry.size();
        self.stats.record_eviction();
        debug!(key = %entry.key, size = entry.size(), "Evicted cache entry");
        Some(entry)
    }

    // == Accessors ==
    /// Sum of all entries' body sizes.
    pub fn total_size(&self) -> usize {
        self.total_size
    }

    pub fn max_cache_size(&self) -> usize {
        self.max_cache_size
    }

    /// Returns the current number of entries in the cache.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Keys in eviction order, oldest first.
    pub fn keys(&self) -> Vec<String> {
        self.order.iter().map(|e| e.key.clone()).collect()
    }

    /// Entries in eviction order, oldest first.
    pub fn entries(&self) -> Vec<Arc<CacheEntry>> {
        self.order.iter().cloned().collect()
    }

    // == Stats ==
    /// Returns insert/evict counters with the current occupancy.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_occupancy(self.len(), self.total_size);
        stats
    }

    // == Check Invariants ==
    /// Walks the whole store and verifies its bookkeeping.
    pub fn check_invariants(&self) -> Result<(), String> {
        let mut accumulated = 0usize;
        let mut seen = 0usize;
        for entry in self.order.iter() {
            if entry.size() == 0 {
                return Err(format!("entry '{}' is empty", entry.key));
            }
            if entry.size() > self.max_object_size {
                return Err(format!("entry '{}' exceeds the object limit", entry.key));
            }
            match self.index.get(&entry.key).and_then(|&h| self.order.get(h)) {
                Some(indexed) if Arc::ptr_eq(indexed, entry) => {}
                _ => return Err(format!("entry '{}' is not indexed", entry.key)),
            }
            accumulated += entry.size();
            seen += 1;
        }
        if seen != self.index.len() {
            return Err(format!("{} entries but {} index keys", seen, self.index.len()));
        }
        if accumulated != self.total_size {
            return Err(format!(
                "size mismatch: counted {} but tracked {}",
                accumulated, self.total_size
            ));
        }
        if self.total_size > self.max_cache_size {
            return Err(format!("total size {} exceeds capacity", self.total_size));
        }
        Ok(())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{DEFAULT_MAX_CACHE_SIZE, DEFAULT_MAX_OBJECT_SIZE};

    fn entry(key: &str, size: usize) -> CacheEntry {
        CacheEntry::new(key, b"HTTP/1.0 200 OK\r\n\r\n".to_vec(), vec![b'x'; size])
    }

    fn default_store() -> CacheStore {
        CacheStore::new(DEFAULT_MAX_CACHE_SIZE, DEFAULT_MAX_OBJECT_SIZE)
    }

    #[test]
    fn test_store_new() {
        let store = default_store();
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
        assert_eq!(store.total_size(), 0);
    }

    #[test]
    fn test_store_insert_and_get() {
        let mut store = default_store();

        store.insert(entry("example.com/", 200)).unwrap();
        let found = store.get("example.com/").unwrap();

        assert_eq!(found.body, vec![b'x'; 200]);
        assert_eq!(store.len(), 1);
        assert_eq!(store.total_size(), 200);
    }

    #[test]
    fn test_store_get_nonexistent() {
        let store = default_store();
        assert!(store.get("nonexistent").is_none());
    }

    #[test]
    fn test_store_rejects_oversized_object() {
        let mut store = default_store();

        let result = store.insert(entry("big", DEFAULT_MAX_OBJECT_SIZE + 1));
        assert!(matches!(result, Err(CacheError::ObjectTooLarge { .. })));
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_accepts_object_at_limit() {
        let mut store = default_store();
        store.insert(entry("edge", DEFAULT_MAX_OBJECT_SIZE)).unwrap();
        assert_eq!(store.total_size(), DEFAULT_MAX_OBJECT_SIZE);
    }

    #[test]
    fn test_store_rejects_empty_object() {
        let mut store = default_store();
        assert!(matches!(
            store.insert(entry("empty", 0)),
            Err(CacheError::EmptyObject(_))
        ));
    }

    #[test]
    fn test_store_fifo_eviction() {
        let mut store = CacheStore::new(300, 100);

        store.insert(entry("a", 100)).unwrap();
        store.insert(entry("b", 100)).unwrap();
        store.insert(entry("c", 100)).unwrap();

        // Full, adding d evicts a (oldest)
        let evicted = store.insert(entry("d", 100)).unwrap();

        assert_eq!(evicted, 1);
        assert_eq!(store.keys(), vec!["b", "c", "d"]);
        assert!(store.get("a").is_none());
        store.check_invariants().unwrap();
    }

    #[test]
    fn test_store_promote_changes_eviction_order() {
        let mut store = CacheStore::new(300, 100);

        store.insert(entry("a", 100)).unwrap();
        store.insert(entry("b", 100)).unwrap();
        store.insert(entry("c", 100)).unwrap();

        let a = Arc::clone(store.get("a").unwrap());
        assert!(store.promote("a", &a));

        // Adding d now evicts b
        store.insert(entry("d", 100)).unwrap();
        assert_eq!(store.keys(), vec!["c", "a", "d"]);
    }

    #[test]
    fn test_store_promote_ignores_replaced_entry() {
        let mut store = default_store();

        store.insert(entry("k", 10)).unwrap();
        let stale = Arc::clone(store.get("k").unwrap());
        store.insert(entry("other", 10)).unwrap();
        store.insert(entry("k", 20)).unwrap();

        assert!(!store.promote("k", &stale));
        assert_eq!(store.keys(), vec!["other", "k"]);
    }

    #[test]
    fn test_store_entries_follow_eviction_order() {
        let mut store = default_store();
        store.insert(entry("a", 10)).unwrap();
        store.insert(entry("b", 20)).unwrap();
        let a = Arc::clone(store.get("a").unwrap());
        store.promote("a", &a);

        let entries = store.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].key, "b");
        assert_eq!(entries[0].size(), 20);
        assert!(Arc::ptr_eq(&entries[1], &a));
    }

    #[test]
    fn test_store_promote_missing_key() {
        let mut store = default_store();
        store.insert(entry("k", 10)).unwrap();
        let e = Arc::clone(store.get("k").unwrap());
        store.evict_oldest();

        assert!(!store.promote("k", &e));
    }

    #[test]
    fn test_store_replace_keeps_keys_unique() {
        let mut store = default_store();

        store.insert(entry("k", 10)).unwrap();
        store.insert(entry("k", 30)).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.total_size(), 30);
        store.check_invariants().unwrap();
    }

    #[test]
    fn test_store_evict_empty_is_noop() {
        let mut store = default_store();
        for _ in 0..3 {
            assert!(store.evict_oldest().is_none());
        }
        assert_eq!(store.total_size(), 0);
        assert_eq!(store.stats().evictions, 0);
    }

    #[test]
    fn test_store_eviction_arithmetic_with_literal_limits() {
        // 500_000 + 500_000 fits in 1_049_000; adding 100_000 would make
        // 1_100_000, so exactly the first entry goes.
        let mut store = CacheStore::new(1_049_000, 1_049_000);

        assert_eq!(store.insert(entry("first", 500_000)).unwrap(), 0);
        assert_eq!(store.insert(entry("second", 500_000)).unwrap(), 0);
        assert_eq!(store.total_size(), 1_000_000);

        assert_eq!(store.insert(entry("third", 100_000)).unwrap(), 1);
        assert_eq!(store.keys(), vec!["second", "third"]);
        assert_eq!(store.total_size(), 600_000);
    }

    #[test]
    fn test_store_exact_fit_does_not_evict() {
        let mut store = CacheStore::new(1_049_000, 1_049_000);
        store.insert(entry("a", 1_000_000)).unwrap();
        assert_eq!(store.insert(entry("b", 49_000)).unwrap(), 0);
        assert_eq!(store.total_size(), 1_049_000);
    }

    #[test]
    fn test_store_stats() {
        let mut store = CacheStore::new(200, 100);

        store.insert(entry("a", 100)).unwrap();
        store.insert(entry("b", 100)).unwrap();
        store.insert(entry("c", 50)).unwrap();

        let stats = store.stats();
        assert_eq!(stats.insertions, 3);
        assert_eq!(stats.evictions, 1);
        assert_eq!(stats.total_entries, 2);
        assert_eq!(stats.total_size, 150);
    }

    #[test]
    fn test_store_roundtrip_headers_and_body() {
        let mut store = default_store();
        let headers = b"HTTP/1.0 200 OK\r\nContent-Type: text/plain\r\n\r\n".to_vec();
        let body = b"hello world".to_vec();

        store
            .insert(CacheEntry::new("h/p", headers.clone(), body.clone()))
            .unwrap();

        let found = store.get("h/p").unwrap();
        assert_eq!(found.headers, headers);
        assert_eq!(found.body, body);
    }
}
