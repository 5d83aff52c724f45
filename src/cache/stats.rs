//! Cache Statistics Module
//!
//! Tracks cache activity including hits, misses, insertions, and evictions.

use serde::Serialize;

// == Cache Stats ==
/// Snapshot of cache activity and occupancy.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Lookups served from the cache
    pub hits: u64,
    /// Lookups that went to the origin
    pub misses: u64,
    /// Entries removed to make room
    pub evictions: u64,
    /// Entries added
    pub insertions: u64,
    /// Current number of entries in the cache
    pub total_entries: usize,
    /// Current body bytes held
    pub total_size: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn record_insertion(&mut self) {
        self.insertions += 1;
    }

    // == Update Occupancy ==
    /// Updates entry count and byte total.
    pub fn set_occupancy(&mut self, entries: usize, size: usize) {
        self.total_entries = entries;
        self.total_size = size;
    }
}
