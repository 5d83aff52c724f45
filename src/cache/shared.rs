//! Shared Cache Module
//!
//! Synchronized handle to the [`CacheStore`] used by every connection task.
//!
//! # Locking
//! - Lookups and serving a hit run under the shared (read) lock, so any
//!   number of connections can read concurrently.
//! - Inserting and evicting take the exclusive (write) lock.
//! - Promoting a hit to the most recent end takes the promotion mutex and
//!   then the write lock, so at most one promotion is in flight.
//!
//! The read guard is always released before waiting on the promotion mutex.
//! Holding it while waiting would deadlock against a promoter that already
//! holds the mutex and is waiting for the write lock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::cache::{CacheEntry, CacheStats, CacheStore};
use crate::config::Config;
use crate::error::CacheError;

#[derive(Debug)]
struct Inner {
    store: RwLock<CacheStore>,
    promotion: Mutex<()>,
    hits: AtomicU64,
    misses: AtomicU64,
}

// == Shared Cache ==
/// Cloneable, thread-safe cache handle.
#[derive(Debug, Clone)]
pub struct SharedCache {
    inner: Arc<Inner>,
}

impl SharedCache {
    // == Constructor ==
    /// Wraps a store for shared use.
    pub fn new(store: CacheStore) -> Self {
        Self {
            inner: Arc::new(Inner {
                store: RwLock::new(store),
                promotion: Mutex::new(()),
                hits: AtomicU64::new(0),
                misses: AtomicU64::new(0),
            }),
        }
    }

    /// Creates an empty cache sized from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(CacheStore::new(config.max_cache_size, config.max_object_size))
    }

    // == Serve ==
    /// Writes a cached response for `key` to `client` if one exists.
    ///
    /// The response is written while the read lock is held; the entry is
    /// promoted afterwards. Returns Ok(false) on a miss, in which case nothing
    /// was written.
    pub async fn serve<W>(&self, key: &str, client: &mut W) -> std::io::Result<bool>
    where
        W: AsyncWrite + Unpin,
    {
        let store = self.inner.store.read().await;
        let Some(entry) = store.get(key).cloned() else {
            drop(store);
            self.inner.misses.fetch_add(1, Ordering::Relaxed);
            debug!(key, "Cache miss");
            return Ok(false);
        };
        self.inner.hits.fetch_add(1, Ordering::Relaxed);
        debug!(key, size = entry.size(), "Cache hit");

        let written = async {
            client.write_all(&entry.headers).await?;
            client.write_all(&entry.body).await?;
            client.flush().await
        }
        .await;
        drop(store);

        self.promote(key, &entry).await;
        written.map(|_| true)
    }

    // == Lookup ==
    /// Returns the entry for `key`, promoting it on a hit.
    #[cfg(test)]
    pub(crate) async fn lookup(&self, key: &str) -> Option<Arc<CacheEntry>> {
        let entry = {
            let store = self.inner.store.read().await;
            store.get(key).cloned()
        };
        match entry {
            Some(entry) => {
                self.inner.hits.fetch_add(1, Ordering::Relaxed);
                self.promote(key, &entry).await;
                Some(entry)
            }
            None => {
                self.inner.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    async fn promote(&self, key: &str, entry: &Arc<CacheEntry>) {
        let _promotion = self.inner.promotion.lock().await;
        let mut store = self.inner.store.write().await;
        if !store.promote(key, entry) {
            debug!(key, "Entry left the cache before promotion");
        }
    }

    // == Insert ==
    /// Stores a captured response, evicting oldest entries until it fits.
    ///
    /// Returns the number of entries evicted.
    pub async fn insert(&self, entry: CacheEntry) -> Result<usize, CacheError> {
        let key = entry.key.clone();
        let size = entry.size();
        let mut store = self.inner.store.write().await;
        let evicted = store.insert(entry)?;
        debug!(
            key = %key,
            size,
            evicted,
            total_size = store.total_size(),
            "Cached response"
        );
        Ok(evicted)
    }

    // == Stats ==
    /// Returns a snapshot of activity counters and occupancy.
    pub async fn stats(&self) -> CacheStats {
        let mut stats = self.inner.store.read().await.stats();
        stats.hits = self.inner.hits.load(Ordering::Relaxed);
        stats.misses = self.inner.misses.load(Ordering::Relaxed);
        stats
    }

    /// Keys in eviction order, oldest first.
    pub async fn keys(&self) -> Vec<String> {
        self.inner.store.read().await.keys()
    }

    /// Entries in eviction order, oldest first.
    pub async fn entries(&self) -> Vec<Arc<CacheEntry>> {
        self.inner.store.read().await.entries()
    }

    pub async fn max_cache_size(&self) -> usize {
        self.inner.store.read().await.max_cache_size()
    }

    /// Verifies the store's bookkeeping under the read lock.
    pub async fn check_invariants(&self) -> Result<(), String> {
        self.inner.store.read().await.check_invariants()
    }
}
