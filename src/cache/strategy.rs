//! Strategy Module
//!
//! Request-serving strategies and the fetch function type they orchestrate.

use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::{Deserialize, Serialize};

// == Fetcher ==
/// Caller-supplied zero-argument async operation producing a value.
///
/// Shared so the engine can keep it as an entry's refresher.
pub type Fetcher<V> = Arc<dyn Fn() -> BoxFuture<'static, anyhow::Result<V>> + Send + Sync>;

/// Wraps an async closure as a [`Fetcher`].
///
/// # Example
/// ```ignore
/// let fetch = fetcher(|| async { Ok("value".to_string()) });
/// ```
pub fn fetcher<V, F, Fut>(f: F) -> Fetcher<V>
where
    V: 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<V>> + Send + 'static,
{
    Arc::new(move || f().boxed())
}

// == Strategy ==
/// How cache state and a fetch are combined to answer a read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Serve a live entry; fetch and store on a miss.
    #[default]
    CacheFirst,
    /// Fetch and store; fall back to a live entry if the fetch fails.
    NetworkFirst,
    /// Serve a live entry or fail; never fetch.
    CacheOnly,
    /// Always fetch; never touch the store.
    NetworkOnly,
    /// Serve a live entry and refresh it in the background; fetch on a miss.
    StaleWhileRevalidate,
}

impl Strategy {
    pub const ALL: [Strategy; 5] = [
        Strategy::CacheFirst,
        Strategy::NetworkFirst,
        Strategy::CacheOnly,
        Strategy::NetworkOnly,
        Strategy::StaleWhileRevalidate,
    ];

    /// Whether a fetch function must be supplied.
    pub fn requires_fetch(self) -> bool {
        !matches!(self, Strategy::CacheOnly)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::CacheFirst => "cache_first",
            Strategy::NetworkFirst => "network_first",
            Strategy::CacheOnly => "cache_only",
            Strategy::NetworkOnly => "network_only",
            Strategy::StaleWhileRevalidate => "stale_while_revalidate",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Strategy::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == s)
            .ok_or_else(|| format!("unknown strategy '{}'", s))
    }
}
