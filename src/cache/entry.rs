//! Cache Entry Module
//!
//! Defines the structure for individual cache entries and their liveness rule.

use std::time::{Duration, Instant};

use crate::cache::Fetcher;
use crate::clock::TimerHandle;

// == Cache Entry ==
/// A stored value plus the bookkeeping the store needs to expire and evict it.
pub struct CacheEntry<V> {
    /// The stored value, replaced wholesale on every write
    pub value: V,
    /// Last write or last live read
    pub last_update_at: Instant,
    /// Write stamp, changes on every write of this key
    pub version: u64,
    /// Insertion stamp, fixed when the key is first stored
    pub seq: u64,
    /// Pending expiry callback (Active mode only)
    pub expiry: Option<TimerHandle>,
    /// Fetch function that last populated this entry
    pub refresher: Option<Fetcher<V>>,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new entry stamped at `now`.
    pub fn new(value: V, now: Instant, stamp: u64) -> Self {
        Self {
            value,
            last_update_at: now,
            version: stamp,
            seq: stamp,
            expiry: None,
            refresher: None,
        }
    }

    // == Is Live ==
    /// Checks the entry against a TTL.
    ///
    /// A zero TTL never expires. Otherwise the entry is live while its age is
    /// strictly below `ttl`.
    pub fn is_live(&self, now: Instant, ttl: Duration) -> bool {
        ttl.is_zero() || self.age(now) < ttl
    }

    // == Age ==
    /// Time since the last write or live read.
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_update_at)
    }

    // == Cancel Expiry ==
    /// Cancels and drops the pending expiry callback, if any.
    pub fn cancel_expiry(&mut self) {
        if let Some(handle) = self.expiry.take() {
            handle.cancel();
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_creation() {
        let now = Instant::now();
        let entry = CacheEntry::new("test_value".to_string(), now, 7);

        assert_eq!(entry.value, "test_value");
        assert_eq!(entry.version, 7);
        assert_eq!(entry.seq, 7);
        assert!(entry.expiry.is_none());
        assert!(entry.refresher.is_none());
    }

    #[test]
    fn test_zero_ttl_never_expires() {
        let now = Instant::now();
        let entry = CacheEntry::new(1u32, now, 0);

        assert!(entry.is_live(now + Duration::from_secs(86_400 * 365), Duration::ZERO));
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let now = Instant::now();
        let ttl = Duration::from_secs(10);
        let entry = CacheEntry::new(1u32, now, 0);

        assert!(entry.is_live(now + Duration::from_millis(9_999), ttl));
        // Age equal to the TTL is no longer live
        assert!(!entry.is_live(now + ttl, ttl));
    }

    #[test]
    fn test_age_saturates_for_earlier_instants() {
        let now = Instant::now();
        let entry = CacheEntry::new(1u32, now + Duration::from_secs(1), 0);

        assert_eq!(entry.age(now), Duration::ZERO);
    }
}
