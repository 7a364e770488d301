//! Cache Events Module
//!
//! Discrete events emitted by the store, and the observer seam that receives them.

use std::fmt;

use tracing::debug;

// == Cache Event ==
/// Something observable happened to a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    /// A live entry was read
    Hit(String),
    /// No live entry existed for a read
    Miss(String),
    /// An entry was removed to make room for a new key
    Evict(String),
    /// An entry reached its TTL
    Expire(String),
}

impl CacheEvent {
    pub fn key(&self) -> &str {
        match self {
            CacheEvent::Hit(key)
            | CacheEvent::Miss(key)
            | CacheEvent::Evict(key)
            | CacheEvent::Expire(key) => key,
        }
    }
}

impl fmt::Display for CacheEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            CacheEvent::Hit(_) => "hit",
            CacheEvent::Miss(_) => "miss",
            CacheEvent::Evict(_) => "evict",
            CacheEvent::Expire(_) => "expire",
        };
        write!(f, "{} {}", kind, self.key())
    }
}

// == Observer ==
/// Receives every [`CacheEvent`] while the store lock is held.
///
/// Implementations must not call back into the cache.
pub trait CacheObserver: Send + Sync {
    fn on_event(&self, event: &CacheEvent);
}

/// Default observer, logs each event at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl CacheObserver for TracingObserver {
    fn on_event(&self, event: &CacheEvent) {
        debug!(key = event.key(), "cache {}", event);
    }
}

impl<F> CacheObserver for F
where
    F: Fn(&CacheEvent) + Send + Sync,
{
    fn on_event(&self, event: &CacheEvent) {
        self(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_event_display() {
        assert_eq!(CacheEvent::Hit("a".into()).to_string(), "hit a");
        assert_eq!(CacheEvent::Evict("b".into()).to_string(), "evict b");
    }

    #[test]
    fn test_closure_observer() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let observer = move |event: &CacheEvent| sink.lock().unwrap().push(event.clone());

        observer.on_event(&CacheEvent::Miss("k".into()));
        TracingObserver.on_event(&CacheEvent::Miss("k".into()));

        assert_eq!(*seen.lock().unwrap(), vec![CacheEvent::Miss("k".into())]);
    }
}
