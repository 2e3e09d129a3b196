//! TTL Cleanup Task
//!
//! Background task that periodically removes expired cache entries.
//! Reads already hide expired entries, the sweep only reclaims memory.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::SharedCache;

/// Spawns a background task that periodically cleans up expired cache entries.
///
/// The task runs in an infinite loop, sleeping for `interval` between
/// sweeps, and takes the write lock only for the duration of a sweep.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let cache = shared(CacheStore::new());
/// let cleanup_handle = spawn_cleanup_task(cache.clone(), Duration::from_secs(1));
/// // Later, during shutdown:
/// cleanup_handle.abort();
/// ```
pub fn spawn_cleanup_task(cache: SharedCache, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(interval_ms = interval.as_millis() as u64, "starting TTL cleanup task");

        loop {
            tokio::time::sleep(interval).await;

            let (removed, remaining) = {
                let mut cache_guard = cache.write().await;
                let removed = cache_guard.cleanup_expired();
                (removed, cache_guard.len())
            };

            if removed > 0 {
                info!(removed, remaining, "TTL cleanup removed expired entries");
            } else {
                debug!(remaining, "TTL cleanup found no expired entries");
            }
        }
    })
}
