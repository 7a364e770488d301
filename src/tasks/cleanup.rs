//! Expiry Purge Task
//!
//! Background task that periodically removes lazily expired cache entries.
//! Without it, an expired entry only leaves the store when a capacity sweep
//! runs.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::Cache;

/// Spawns a background task that purges expired entries every
/// `cleanup_interval_secs` seconds.
///
/// Returns `None` when the interval is 0. The returned handle should be
/// aborted during graceful shutdown.
///
/// # Example
/// ```ignore
/// let cache = Cache::new(config);
/// let cleanup_handle = spawn_cleanup_task(cache.clone(), 1);
/// ```
pub fn spawn_cleanup_task<V>(cache: Cache<V>, cleanup_interval_secs: u64) -> Option<JoinHandle<()>>
where
    V: Clone + Send + Sync + 'static,
{
    if cleanup_interval_secs == 0 {
        return None;
    }
    let interval = Duration::from_secs(cleanup_interval_secs);

    Some(tokio::spawn(async move {
        info!(
            "Starting expiry purge task with interval of {} seconds",
            cleanup_interval_secs
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.purge_expired().await;
            if removed > 0 {
                info!("Expiry purge: removed {} expired entries", removed);
            } else {
                debug!("Expiry purge: no expired entries found");
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheConfig, ExpiryMode};

    fn lazy_cache(ttl: Duration) -> Cache<String> {
        Cache::new(CacheConfig::new(0, ttl, ExpiryMode::Lazy))
    }

    #[tokio::test]
    async fn test_zero_interval_disables_task() {
        assert!(spawn_cleanup_task(lazy_cache(Duration::from_secs(1)), 0).is_none());
    }

    #[tokio::test]
    async fn test_cleanup_task_removes_expired_entries() {
        let cache = lazy_cache(Duration::from_millis(500));
        cache.set("expire_soon", "value".to_string()).await.unwrap();

        let handle = spawn_cleanup_task(cache.clone(), 1).unwrap();

        // Wait for the entry to expire and the purge to run
        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert!(cache.is_empty().await, "Expired entry should have been purged");
        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_preserves_valid_entries() {
        let cache = lazy_cache(Duration::from_secs(3600));
        cache.set("long_lived", "value".to_string()).await.unwrap();

        let handle = spawn_cleanup_task(cache.clone(), 1).unwrap();
        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert_eq!(cache.get("long_lived").await.unwrap(), "value");
        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_can_be_aborted() {
        let handle = spawn_cleanup_task(lazy_cache(Duration::from_secs(1)), 1).unwrap();

        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
