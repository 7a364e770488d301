//! Cache Engine Module
//!
//! Thread-safe handle over a [`CacheStore`]: applies the clock and scheduler,
//! and dispatches strategy-based reads.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use futures::FutureExt;
use tokio::sync::{Mutex, MutexGuard, Notify};
use tracing::{debug, warn};

use crate::cache::{
    CacheConfig, CacheObserver, CacheStats, CacheStore, Expiry, ExpiryMode, Fetcher, Strategy,
    TracingObserver, MAX_KEY_LENGTH,
};
use crate::clock::{Clock, Scheduler, SystemClock, TokioScheduler};
use crate::error::{CacheError, Result};

// == Cache ==
/// Cheaply cloneable cache engine handle.
///
/// All clones share one store guarded by a single mutex. The mutex is never
/// held while a fetch function runs.
pub struct Cache<V> {
    inner: Arc<Inner<V>>,
}

struct Inner<V> {
    store: Mutex<CacheStore<V>>,
    config: CacheConfig,
    clock: Arc<dyn Clock>,
    scheduler: Arc<dyn Scheduler>,
    revalidating: AtomicUsize,
    settled: Notify,
}

impl<V> Clone for Cache<V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

// == Builder ==
/// Builds a [`Cache`] with injected collaborators.
pub struct CacheBuilder {
    config: CacheConfig,
    clock: Arc<dyn Clock>,
    scheduler: Arc<dyn Scheduler>,
    observer: Arc<dyn CacheObserver>,
}

impl CacheBuilder {
    /// Starts from the system clock, the Tokio scheduler and tracing events.
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            clock: Arc::new(SystemClock),
            scheduler: Arc::new(TokioScheduler),
            observer: Arc::new(TracingObserver),
        }
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = scheduler;
        self
    }

    pub fn observer(mut self, observer: Arc<dyn CacheObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn build<V>(self) -> Cache<V>
    where
        V: Clone + Send + Sync + 'static,
    {
        Cache {
            inner: Arc::new(Inner {
                store: Mutex::new(CacheStore::new(&self.config, self.observer)),
                config: self.config,
                clock: self.clock,
                scheduler: self.scheduler,
                revalidating: AtomicUsize::new(0),
                settled: Notify::new(),
            }),
        }
    }
}

impl<V> Cache<V>
where
    V: Clone + Send + Sync + 'static,
{
    // == Constructors ==
    /// Creates a cache on the system clock and the Tokio scheduler.
    pub fn new(config: CacheConfig) -> Self {
        CacheBuilder::new(config).build()
    }

    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    // == Get ==
    /// Plain read: the live value, or `NotFound`.
    pub async fn get(&self, key: &str) -> Result<V> {
        validate_key(key)?;
        self.inner
            .lookup(key)
            .await
            .map(|(value, _)| value)
            .ok_or_else(|| CacheError::NotFound(key.to_string()))
    }

    // == Get With Strategy ==
    /// Strategy-based read.
    ///
    /// Fails with `InvalidArgument` before touching the store when the
    /// strategy needs a fetch function and none is given.
    pub async fn get_with(
        &self,
        key: &str,
        fetch: Option<Fetcher<V>>,
        strategy: Strategy,
    ) -> Result<V> {
        validate_key(key)?;
        let fetch = match fetch {
            Some(fetch) => fetch,
            None if strategy.requires_fetch() => {
                return Err(CacheError::InvalidArgument(format!(
                    "strategy {} requires a fetch function",
                    strategy
                )))
            }
            None => return self.get(key).await,
        };

        match strategy {
            Strategy::CacheFirst => match self.inner.lookup(key).await {
                Some((value, _)) => Ok(value),
                None => self.inner.fetch_and_store(key, fetch).await,
            },
            Strategy::NetworkFirst => {
                let fetched = fetch().await;
                match fetched {
                    Ok(value) => {
                        self.inner.store_value(key, value.clone(), Some(fetch)).await;
                        Ok(value)
                    }
                    Err(cause) => match self.inner.lookup(key).await {
                        Some((value, _)) => {
                            debug!(key, error = %cause, "fetch failed, serving cached value");
                            Ok(value)
                        }
                        None => Err(CacheError::FetchFailed(cause)),
                    },
                }
            }
            Strategy::CacheOnly => self.get(key).await,
            Strategy::NetworkOnly => fetch().await.map_err(CacheError::FetchFailed),
            Strategy::StaleWhileRevalidate => match self.inner.lookup(key).await {
                Some((value, version)) => {
                    self.inner.revalidate(key.to_string(), version, fetch);
                    Ok(value)
                }
                None => self.inner.fetch_and_store(key, fetch).await,
            },
        }
    }

    // == Set ==
    /// Upserts a value.
    pub async fn set(&self, key: &str, value: V) -> Result<()> {
        validate_key(key)?;
        self.inner.store_value(key, value, None).await;
        Ok(())
    }

    // == Delete ==
    /// Removes a key. Absent keys are a no-op.
    pub async fn del(&self, key: &str) {
        if self.inner.lock().await.remove(key) {
            debug!(key, "cache entry deleted");
        }
    }

    // == Delete All ==
    pub async fn del_all(&self) {
        self.inner.lock().await.clear();
        debug!("all cache entries deleted");
    }

    // == Keys ==
    pub async fn get_keys(&self) -> Vec<String> {
        self.inner.lock().await.keys()
    }

    // == Purge Expired ==
    /// Physically removes lazily expired entries. Returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = self.inner.clock.now();
        self.inner.lock().await.purge_expired(now)
    }

    pub async fn stats(&self) -> CacheStats {
        self.inner.lock().await.stats()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.is_empty()
    }

    // == Settle ==
    /// Waits until every background revalidation has finished.
    pub async fn settle(&self) {
        loop {
            let settled = self.inner.settled.notified();
            if self.inner.revalidating.load(Ordering::Acquire) == 0 {
                return;
            }
            settled.await;
        }
    }
}

impl<V> Inner<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn lock(&self) -> MutexGuard<'_, CacheStore<V>> {
        self.store.lock().await
    }

    /// Live read; in Active mode a hit pushes the expiry callback back.
    async fn lookup(self: &Arc<Self>, key: &str) -> Option<(V, u64)> {
        let now = self.clock.now();
        let mut store = self.lock().await;
        let hit = store.get(key, now)?;
        self.arm_expiry(&mut store, key, hit.1);
        Some(hit)
    }

    async fn store_value(self: &Arc<Self>, key: &str, value: V, refresher: Option<Fetcher<V>>) {
        let now = self.clock.now();
        let mut store = self.lock().await;
        let version = store.insert(key, value, refresher, now);
        self.arm_expiry(&mut store, key, version);
    }

    async fn fetch_and_store(self: &Arc<Self>, key: &str, fetch: Fetcher<V>) -> Result<V> {
        let value = fetch().await.map_err(CacheError::FetchFailed)?;
        self.store_value(key, value.clone(), Some(fetch)).await;
        Ok(value)
    }

    /// Commits `value` only if the entry is still at `version`.
    ///
    /// A given `refresher` becomes the fetch that Active expiry re-runs.
    async fn commit(
        self: &Arc<Self>,
        key: &str,
        version: u64,
        value: V,
        refresher: Option<Fetcher<V>>,
    ) -> bool {
        let now = self.clock.now();
        let mut store = self.lock().await;
        match store.commit_if_current(key, version, value, refresher, now) {
            Some(next) => {
                self.arm_expiry(&mut store, key, next);
                true
            }
            None => false,
        }
    }

    /// Schedules the Active-mode expiry callback for `key` at `version`.
    fn arm_expiry(self: &Arc<Self>, store: &mut CacheStore<V>, key: &str, version: u64) {
        if self.config.expiry_mode != ExpiryMode::Active || self.config.ttl.is_zero() {
            return;
        }

        let weak: Weak<Self> = Arc::downgrade(self);
        let owned_key = key.to_string();
        let task = async move {
            if let Some(inner) = weak.upgrade() {
                inner.on_expiry(owned_key, version).await;
            }
        }
        .boxed();

        let handle = self.scheduler.schedule(self.config.ttl, task);
        store.attach_timer(key, version, handle);
    }

    async fn on_expiry(self: Arc<Self>, key: String, version: u64) {
        let refresher = match self.lock().await.begin_expiry(&key, version) {
            Expiry::Refresh(refresher) => refresher,
            Expiry::Removed => {
                debug!(key = %key, "expired entry removed");
                return;
            }
            Expiry::Stale => return,
        };

        match refresher().await {
            Ok(value) => {
                if self.commit(&key, version, value, None).await {
                    debug!(key = %key, "expired entry refreshed");
                }
            }
            Err(error) => {
                warn!(key = %key, error = %error, "refresh failed, dropping expired entry");
                self.lock().await.remove_if_current(&key, version);
            }
        }
    }

    /// Fire-and-forget refresh after a stale-while-revalidate hit.
    fn revalidate(self: &Arc<Self>, key: String, version: u64, fetch: Fetcher<V>) {
        let guard = InFlight::enter(self.clone());

        tokio::spawn(async move {
            let inner = guard.inner.clone();
            match fetch().await {
                Ok(value) => {
                    if !inner.commit(&key, version, value, Some(fetch)).await {
                        debug!(key = %key, "entry changed during revalidation, result discarded");
                    }
                }
                Err(error) => {
                    warn!(key = %key, error = %error, "background revalidation failed");
                }
            }
            drop(guard);
        });
    }
}

// == In-Flight Guard ==
/// Counts one background revalidation until dropped, including on unwind,
/// so [`Cache::settle`] cannot wait on a task that panicked.
struct InFlight<V> {
    inner: Arc<Inner<V>>,
}

impl<V> InFlight<V> {
    fn enter(inner: Arc<Inner<V>>) -> Self {
        inner.revalidating.fetch_add(1, Ordering::AcqRel);
        Self { inner }
    }
}

impl<V> Drop for InFlight<V> {
    fn drop(&mut self) {
        if self.inner.revalidating.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.inner.settled.notify_waiters();
        }
    }
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::InvalidArgument("Key cannot be empty".to_string()));
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(CacheError::InvalidArgument(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        )));
    }
    Ok(())
}
