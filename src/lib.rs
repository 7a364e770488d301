//! Strategy Cache - An in-process cache engine
//!
//! Bounded entry store with lazy or active TTL expiry, and strategy-based
//! reads (cache-first, network-first, cache-only, network-only,
//! stale-while-revalidate) over caller-supplied fetch functions.

pub mod api;
pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod items;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::{fetcher, Cache, CacheBuilder, CacheConfig, ExpiryMode, Fetcher, Strategy};
pub use config::Config;
pub use error::CacheError;
pub use tasks::spawn_cleanup_task;
