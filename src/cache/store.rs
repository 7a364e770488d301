//! Cache Store Module
//!
//! Bounded key/entry map. Owns capacity enforcement, TTL liveness, statistics
//! and event emission. Time is passed in by the caller; scheduling of Active
//! expiry callbacks is done by the engine, which hands the resulting
//! [`TimerHandle`]s back to the store.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::cache::{CacheConfig, CacheEntry, CacheEvent, CacheObserver, CacheStats, ExpiryMode, Fetcher};
use crate::clock::TimerHandle;

// == Expiry Outcome ==
/// What an Active-mode expiry callback should do.
pub enum Expiry<V> {
    /// Entry was replaced or deleted after the callback was scheduled
    Stale,
    /// Entry had no refresher and was removed
    Removed,
    /// Entry should be refreshed with this fetch function
    Refresh(Fetcher<V>),
}

// == Cache Store ==
pub struct CacheStore<V> {
    entries: HashMap<String, CacheEntry<V>>,
    stats: CacheStats,
    max_entries: usize,
    ttl: Duration,
    mode: ExpiryMode,
    next_stamp: u64,
    observer: Arc<dyn CacheObserver>,
}

impl<V: Clone> CacheStore<V> {
    // == Constructor ==
    pub fn new(config: &CacheConfig, observer: Arc<dyn CacheObserver>) -> Self {
        Self {
            entries: HashMap::new(),
            stats: CacheStats::new(),
            max_entries: config.max_entries,
            ttl: config.ttl,
            mode: config.expiry_mode,
            next_stamp: 0,
            observer,
        }
    }

    // == Get ==
    /// Returns the value and version of a live entry, or `None` on a miss.
    ///
    /// A live hit moves `last_update_at` to `now`. In Lazy mode an expired
    /// entry is reported as a miss but left in place until the next sweep.
    pub fn get(&mut self, key: &str, now: Instant) -> Option<(V, u64)> {
        let ttl = self.ttl;
        let mode = self.mode;

        let hit = match self.entries.get_mut(key) {
            Some(entry) if mode == ExpiryMode::Active || entry.is_live(now, ttl) => {
                entry.last_update_at = now;
                Some((entry.value.clone(), entry.version))
            }
            _ => None,
        };

        if hit.is_some() {
            self.stats.record_hit();
            self.emit(CacheEvent::Hit(key.to_string()));
        } else {
            self.stats.record_miss();
            self.emit(CacheEvent::Miss(key.to_string()));
        }
        hit
    }

    // == Insert ==
    /// Upserts `value` under `key` and returns the new version.
    ///
    /// Inserting a new key into a full store runs the eviction routine first;
    /// replacing an existing key never evicts. Any pending expiry callback of
    /// the previous entry is cancelled. When `refresher` is `None` the
    /// previous refresher, if any, is kept.
    pub fn insert(
        &mut self,
        key: &str,
        value: V,
        refresher: Option<Fetcher<V>>,
        now: Instant,
    ) -> u64 {
        if !self.entries.contains_key(key)
            && self.max_entries > 0
            && self.entries.len() >= self.max_entries
        {
            self.make_room(now);
        }

        let stamp = self.next_stamp();
        match self.entries.get_mut(key) {
            Some(entry) => {
                entry.cancel_expiry();
                entry.value = value;
                entry.last_update_at = now;
                entry.version = stamp;
                if refresher.is_some() {
                    entry.refresher = refresher;
                }
            }
            None => {
                let mut entry = CacheEntry::new(value, now, stamp);
                entry.refresher = refresher;
                self.entries.insert(key.to_string(), entry);
            }
        }

        self.stats.set_total_entries(self.entries.len());
        stamp
    }

    // == Commit If Current ==
    /// Replaces the value only if the entry still carries `version`.
    ///
    /// A given `refresher` replaces the entry's current one. Returns the new
    /// version, or `None` when the entry was deleted or rewritten since
    /// `version` was observed.
    pub fn commit_if_current(
        &mut self,
        key: &str,
        version: u64,
        value: V,
        refresher: Option<Fetcher<V>>,
        now: Instant,
    ) -> Option<u64> {
        if self.version_of(key) != Some(version) {
            return None;
        }
        Some(self.insert(key, value, refresher, now))
    }

    // == Attach Timer ==
    /// Stores an expiry handle on the entry that carries `version`.
    ///
    /// If the entry is gone or was rewritten the handle is cancelled instead.
    pub fn attach_timer(&mut self, key: &str, version: u64, handle: TimerHandle) {
        match self.entries.get_mut(key) {
            Some(entry) if entry.version == version => {
                entry.cancel_expiry();
                entry.expiry = Some(handle);
            }
            _ => handle.cancel(),
        }
    }

    // == Begin Expiry ==
    /// Handles an Active-mode expiry callback for the entry at `version`.
    pub fn begin_expiry(&mut self, key: &str, version: u64) -> Expiry<V> {
        let refresher = match self.entries.get_mut(key) {
            Some(entry) if entry.version == version => {
                // The firing callback owns this handle; it must not be cancelled later.
                entry.expiry = None;
                entry.refresher.clone()
            }
            _ => return Expiry::Stale,
        };

        self.stats.record_expiration();
        self.emit(CacheEvent::Expire(key.to_string()));

        match refresher {
            Some(refresher) => Expiry::Refresh(refresher),
            None => {
                self.remove(key);
                Expiry::Removed
            }
        }
    }

    // == Remove If Current ==
    /// Removes the entry only if it still carries `version`.
    pub fn remove_if_current(&mut self, key: &str, version: u64) -> bool {
        if self.version_of(key) != Some(version) {
            return false;
        }
        self.remove(key)
    }

    // == Remove ==
    /// Removes an entry and cancels its expiry callback. Absent keys are a no-op.
    pub fn remove(&mut self, key: &str) -> bool {
        match self.entries.remove(key) {
            Some(mut entry) => {
                entry.cancel_expiry();
                self.stats.set_total_entries(self.entries.len());
                true
            }
            None => false,
        }
    }

    // == Clear ==
    pub fn clear(&mut self) {
        for entry in self.entries.values_mut() {
            entry.cancel_expiry();
        }
        self.entries.clear();
        self.stats.set_total_entries(0);
    }

    // == Keys ==
    /// Snapshot of all stored keys in insertion order.
    pub fn keys(&self) -> Vec<String> {
        let mut keyed: Vec<(u64, &String)> = self
            .entries
            .iter()
            .map(|(key, entry)| (entry.seq, key))
            .collect();
        keyed.sort_unstable_by_key(|(seq, _)| *seq);
        keyed.into_iter().map(|(_, key)| key.clone()).collect()
    }

    // == Purge Expired ==
    /// Removes every non-live entry (Lazy mode with a TTL only).
    ///
    /// Returns the number of entries removed.
    pub fn purge_expired(&mut self, now: Instant) -> usize {
        if self.mode != ExpiryMode::Lazy || self.ttl.is_zero() {
            return 0;
        }

        let ttl = self.ttl;
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| !entry.is_live(now, ttl))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.remove(key);
            self.stats.record_expiration();
            self.emit(CacheEvent::Expire(key.clone()));
        }
        expired.len()
    }

    // == Version Of ==
    pub fn version_of(&self, key: &str) -> Option<u64> {
        self.entries.get(key).map(|entry| entry.version)
    }

    // == Stats ==
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // == Make Room ==
    /// Sweeps expired entries, then evicts the least recently updated entry
    /// if the store is still full. Ties go to the earliest inserted key.
    fn make_room(&mut self, now: Instant) {
        self.purge_expired(now);

        if self.entries.len() < self.max_entries {
            return;
        }

        let victim = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| (entry.last_update_at, entry.seq))
            .map(|(key, _)| key.clone());

        if let Some(victim) = victim {
            self.remove(&victim);
            self.stats.record_eviction();
            self.emit(CacheEvent::Evict(victim));
        }
    }

    fn next_stamp(&mut self) -> u64 {
        let stamp = self.next_stamp;
        self.next_stamp += 1;
        stamp
    }

    fn emit(&self, event: CacheEvent) {
        self.observer.on_event(&event);
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{fetcher, TracingObserver};
    use std::sync::Mutex;

    const SECOND: Duration = Duration::from_secs(1);

    fn store(max_entries: usize, ttl_secs: u64, mode: ExpiryMode) -> CacheStore<String> {
        let config = CacheConfig::new(max_entries, Duration::from_secs(ttl_secs), mode);
        CacheStore::new(&config, Arc::new(TracingObserver))
    }

    fn put(store: &mut CacheStore<String>, key: &str, value: &str, now: Instant) -> u64 {
        store.insert(key, value.to_string(), None, now)
    }

    #[test]
    fn test_store_new() {
        let store = store(100, 300, ExpiryMode::Lazy);
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_set_and_get() {
        let mut store = store(100, 300, ExpiryMode::Lazy);
        let now = Instant::now();

        put(&mut store, "key1", "value1", now);
        let (value, _) = store.get("key1", now).unwrap();

        assert_eq!(value, "value1");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_get_nonexistent() {
        let mut store = store(100, 300, ExpiryMode::Lazy);
        assert!(store.get("nonexistent", Instant::now()).is_none());
    }

    #[test]
    fn test_store_remove_absent_is_noop() {
        let mut store = store(100, 300, ExpiryMode::Lazy);
        let now = Instant::now();
        put(&mut store, "key1", "value1", now);

        assert!(!store.remove("nonexistent"));
        assert_eq!(store.keys(), vec!["key1".to_string()]);
    }

    #[test]
    fn test_store_overwrite_bumps_version() {
        let mut store = store(100, 300, ExpiryMode::Lazy);
        let now = Instant::now();

        let first = put(&mut store, "key1", "value1", now);
        let second = put(&mut store, "key1", "value2", now);

        assert!(second > first);
        assert_eq!(store.get("key1", now).unwrap().0, "value2");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_lazy_expiry_reports_miss_but_keeps_entry() {
        let mut store = store(100, 10, ExpiryMode::Lazy);
        let now = Instant::now();
        put(&mut store, "key1", "value1", now);

        assert!(store.get("key1", now + 10 * SECOND).is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_lazy_read_extends_lifetime() {
        let mut store = store(100, 10, ExpiryMode::Lazy);
        let now = Instant::now();
        put(&mut store, "key1", "value1", now);

        assert!(store.get("key1", now + 8 * SECOND).is_some());
        assert!(store.get("key1", now + 16 * SECOND).is_some());
        assert!(store.get("key1", now + 27 * SECOND).is_none());
    }

    #[test]
    fn test_zero_ttl_never_expires() {
        let mut store = store(100, 0, ExpiryMode::Lazy);
        let now = Instant::now();
        put(&mut store, "key1", "value1", now);

        assert!(store.get("key1", now + 1_000_000 * SECOND).is_some());
        assert_eq!(store.purge_expired(now + 1_000_000 * SECOND), 0);
    }

    #[test]
    fn test_active_mode_ignores_timestamps() {
        let mut store = store(100, 10, ExpiryMode::Active);
        let now = Instant::now();
        put(&mut store, "key1", "value1", now);

        assert!(store.get("key1", now + 60 * SECOND).is_some());
        assert_eq!(store.purge_expired(now + 60 * SECOND), 0);
    }

    #[test]
    fn test_eviction_removes_least_recently_updated() {
        let mut store = store(3, 0, ExpiryMode::Lazy);
        let now = Instant::now();

        put(&mut store, "key1", "value1", now);
        put(&mut store, "key2", "value2", now + SECOND);
        put(&mut store, "key3", "value3", now + 2 * SECOND);

        // Reading key1 makes key2 the oldest
        store.get("key1", now + 3 * SECOND).unwrap();
        put(&mut store, "key4", "value4", now + 4 * SECOND);

        assert_eq!(store.len(), 3);
        assert_eq!(store.keys(), vec!["key1", "key3", "key4"]);
        assert_eq!(store.stats().evictions, 1);
    }

    #[test]
    fn test_eviction_tie_breaks_on_insertion_order() {
        let mut store = store(2, 0, ExpiryMode::Lazy);
        let now = Instant::now();

        put(&mut store, "b", "1", now);
        put(&mut store, "a", "2", now);
        put(&mut store, "c", "3", now);

        assert_eq!(store.keys(), vec!["a", "c"]);
    }

    #[test]
    fn test_overwrite_at_capacity_never_evicts() {
        let mut store = store(2, 0, ExpiryMode::Lazy);
        let now = Instant::now();

        put(&mut store, "key1", "value1", now);
        put(&mut store, "key2", "value2", now);
        put(&mut store, "key1", "value3", now + SECOND);

        assert_eq!(store.len(), 2);
        assert_eq!(store.stats().evictions, 0);
    }

    #[test]
    fn test_sweep_prefers_expired_entries() {
        let mut store = store(2, 10, ExpiryMode::Lazy);
        let now = Instant::now();

        put(&mut store, "stale1", "v", now);
        put(&mut store, "stale2", "v", now + SECOND);
        put(&mut store, "fresh", "v", now + 30 * SECOND);

        assert_eq!(store.keys(), vec!["fresh"]);
        let stats = store.stats();
        assert_eq!(stats.expirations, 2);
        assert_eq!(stats.evictions, 0);
    }

    #[test]
    fn test_commit_if_current_rejects_stale_version() {
        let mut store = store(10, 0, ExpiryMode::Lazy);
        let now = Instant::now();

        let observed = put(&mut store, "key1", "old", now);
        put(&mut store, "key1", "newer", now);

        assert!(store
            .commit_if_current("key1", observed, "background".to_string(), None, now)
            .is_none());
        assert_eq!(store.get("key1", now).unwrap().0, "newer");
    }

    #[test]
    fn test_commit_if_current_discards_after_delete() {
        let mut store = store(10, 0, ExpiryMode::Lazy);
        let now = Instant::now();

        let observed = put(&mut store, "key1", "old", now);
        store.remove("key1");

        assert!(store
            .commit_if_current("key1", observed, "background".to_string(), None, now)
            .is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_begin_expiry_without_refresher_removes() {
        let mut store = store(10, 5, ExpiryMode::Active);
        let now = Instant::now();
        let version = put(&mut store, "key1", "value1", now);

        assert!(matches!(store.begin_expiry("key1", version), Expiry::Removed));
        assert!(store.is_empty());
        assert_eq!(store.stats().expirations, 1);
    }

    #[test]
    fn test_begin_expiry_with_refresher_keeps_entry() {
        let mut store = store(10, 5, ExpiryMode::Active);
        let now = Instant::now();
        let refresher = fetcher(|| async { Ok("fresh".to_string()) });
        let version = store.insert("key1", "value1".to_string(), Some(refresher), now);

        assert!(matches!(store.begin_expiry("key1", version), Expiry::Refresh(_)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_begin_expiry_for_rewritten_entry_is_stale() {
        let mut store = store(10, 5, ExpiryMode::Active);
        let now = Instant::now();
        let version = put(&mut store, "key1", "value1", now);
        put(&mut store, "key1", "value2", now);

        assert!(matches!(store.begin_expiry("key1", version), Expiry::Stale));
        assert_eq!(store.stats().expirations, 0);
    }

    #[test]
    fn test_keys_in_insertion_order() {
        let mut store = store(10, 0, ExpiryMode::Lazy);
        let now = Instant::now();
        for key in ["k3", "k1", "k2"] {
            put(&mut store, key, "v", now);
        }
        put(&mut store, "k3", "again", now);

        assert_eq!(store.keys(), vec!["k3", "k1", "k2"]);
    }

    #[test]
    fn test_clear_empties_store() {
        let mut store = store(10, 0, ExpiryMode::Lazy);
        let now = Instant::now();
        put(&mut store, "k1", "v", now);
        put(&mut store, "k2", "v", now);

        store.clear();

        assert!(store.is_empty());
        assert!(store.keys().is_empty());
        assert_eq!(store.stats().total_entries, 0);
    }

    #[test]
    fn test_store_stats_and_events() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let config = CacheConfig::new(1, Duration::ZERO, ExpiryMode::Lazy);
        let mut store: CacheStore<String> = CacheStore::new(
            &config,
            Arc::new(move |event: &CacheEvent| sink.lock().unwrap().push(event.clone())),
        );
        let now = Instant::now();

        put(&mut store, "key1", "value1", now);
        store.get("key1", now).unwrap();
        let _ = store.get("nonexistent", now);
        put(&mut store, "key2", "value2", now);

        let stats = store.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.evictions, 1);
        assert_eq!(stats.total_entries, 1);
        assert_eq!(
            *events.lock().unwrap(),
            vec![
                CacheEvent::Hit("key1".into()),
                CacheEvent::Miss("nonexistent".into()),
                CacheEvent::Evict("key1".into()),
            ]
        );
    }
}
