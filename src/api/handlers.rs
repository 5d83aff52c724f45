//! API Handlers
//!
//! HTTP request handlers for each admin endpoint.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};

use crate::cache::SharedCache;
use crate::models::{HealthResponse, KeysResponse, StatsResponse};

/// Application state shared across all admin handlers.
#[derive(Clone)]
pub struct AdminState {
    /// The proxy's cache
    pub cache: SharedCache,
    /// Process start time, for uptime
    pub started_at: DateTime<Utc>,
}

impl AdminState {
    /// Creates a new AdminState for the given cache.
    pub fn new(cache: SharedCache) -> Self {
        Self {
            cache,
            started_at: Utc::now(),
        }
    }
}

/// Handler for GET /stats
///
/// Returns current cache statistics.
pub async fn stats_handler(State(state): State<AdminState>) -> Json<StatsResponse> {
    let stats = state.cache.stats().await;
    let max_cache_size = state.cache.max_cache_size().await;
    let uptime_secs = (Utc::now() - state.started_at).num_seconds().max(0) as u64;

    Json(StatsResponse::new(stats, max_cache_size, uptime_secs))
}

/// Handler for GET /cache/keys
///
/// Lists cached keys with their size and insertion time, next to be evicted first.
pub async fn keys_handler(State(state): State<AdminState>) -> Json<KeysResponse> {
    Json(KeysResponse::new(&state.cache.entries().await))
}

/// Handler for GET /health
///
/// Returns health status of the proxy.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
