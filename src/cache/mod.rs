//! Cache Module
//!
//! In-process cache engine: bounded entry store, TTL expiry (lazy or active)
//! and strategy-based reads over a caller-supplied fetch function.

mod engine;
mod entry;
mod events;
mod policy;
mod stats;
mod store;
mod strategy;


// Re-export public types
pub use engine::{Cache, CacheBuilder};
pub use entry::CacheEntry;
pub use events::{CacheEvent, CacheObserver, TracingObserver};
pub use policy::{CacheConfig, ExpiryMode};
pub use stats::CacheStats;
pub use store::{CacheStore, Expiry};
pub use strategy::{fetcher, Fetcher, Strategy};

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;
