//! Stats Reporter Task
//!
//! Background task that periodically logs cache statistics.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::SharedCache;

/// Spawns a background task that logs a cache stats snapshot every interval.
///
/// The task runs in an infinite loop, sleeping for the specified interval
/// between reports. It only takes the cache's read lock.
///
/// # Arguments
/// * `cache` - Shared handle to the proxy cache
/// * `interval_secs` - Interval in seconds between reports
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during shutdown.
///
/// # Example
/// ```ignore
/// let cache = SharedCache::from_config(&config);
/// let stats_handle = spawn_stats_task(cache.clone(), 60);
/// // Later, during shutdown:
/// stats_handle.abort();
/// ```
pub fn spawn_stats_task(cache: SharedCache, interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs.max(1));

    tokio::spawn(async move {
        info!("Starting stats reporter with interval of {} seconds", interval_secs);

        loop {
            tokio::time::sleep(interval).await;

            let stats = cache.stats().await;
            match serde_json::to_string(&stats) {
                Ok(snapshot) => info!(
                    hit_rate = stats.hit_rate(),
                    snapshot = %snapshot,
                    "Cache stats"
                ),
                Err(e) => debug!(error = %e, "Could not serialize cache stats"),
            }
        }
    })
}
