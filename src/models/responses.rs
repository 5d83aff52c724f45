//! Response DTOs for the admin API
//!
//! Defines the structure of outgoing HTTP response bodies.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cache::{CacheEntry, CacheStats};

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses
    pub misses: u64,
    /// Number of evictions
    pub evictions: u64,
    /// Number of responses stored
    pub insertions: u64,
    /// Current number of entries in cache
    pub total_entries: usize,
    /// Current body bytes held
    pub total_size: usize,
    /// Capacity in body bytes
    pub max_cache_size: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    /// Seconds since the admin API started
    pub uptime_secs: u64,
}

impl StatsResponse {
    /// Creates a new StatsResponse from a cache statistics snapshot
    pub fn new(stats: CacheStats, max_cache_size: usize, uptime_secs: u64) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            hits: stats.hits,
            misses: stats.misses,
            evictions: stats.evictions,
            insertions: stats.insertions,
            total_entries: stats.total_entries,
            total_size: stats.total_size,
            max_cache_size,
            uptime_secs,
        }
    }
}

/// One cached response as listed by GET /cache/keys
#[derive(Debug, Clone, Serialize)]
pub struct EntrySummary {
    pub key: String,
    /// Body bytes
    pub size: usize,
    pub inserted_at: DateTime<Utc>,
}

/// Response body for the keys endpoint (GET /cache/keys)
#[derive(Debug, Clone, Serialize)]
pub struct KeysResponse {
    /// Number of keys
    pub count: usize,
    /// Keys, next to be evicted first
    pub keys: Vec<String>,
    /// Per-entry details, same order as `keys`
    pub entries: Vec<EntrySummary>,
}

impl KeysResponse {
    pub fn new(entries: &[Arc<CacheEntry>]) -> Self {
        Self {
            count: entries.len(),
            keys: entries.iter().map(|e| e.key.clone()).collect(),
            entries: entries
                .iter()
                .map(|e| EntrySummary {
                    key: e.key.clone(),
                    size: e.size(),
                    inserted_at: e.inserted_at,
                })
                .collect(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
