//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::{CacheConfig, ExpiryMode};

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of cache entries, 0 = unbounded
    pub max_entries: usize,
    /// Entry time-to-live in seconds, 0 = never expires
    pub ttl: u64,
    /// How the TTL is enforced
    pub expiry_mode: ExpiryMode,
    /// HTTP server port
    pub server_port: u16,
    /// Purge task interval in seconds, 0 = disabled
    pub cleanup_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_ENTRIES` - Maximum cache entries (default: 0, unbounded)
    /// - `TTL` - Entry TTL in seconds (default: 0, never expires)
    /// - `EXPIRY_MODE` - `lazy` or `active` (default: lazy)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Purge frequency in seconds (default: 0, disabled)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_entries: parse_var("MAX_ENTRIES").unwrap_or(defaults.max_entries),
            ttl: parse_var("TTL").unwrap_or(defaults.ttl),
            expiry_mode: parse_var("EXPIRY_MODE").unwrap_or(defaults.expiry_mode),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            cleanup_interval: parse_var("CLEANUP_INTERVAL").unwrap_or(defaults.cleanup_interval),
        }
    }

    /// Engine configuration derived from these settings.
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig::new(
            self.max_entries,
            Duration::from_secs(self.ttl),
            self.expiry_mode,
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_entries: 0,
            ttl: 0,
            expiry_mode: ExpiryMode::Lazy,
            server_port: 3000,
            cleanup_interval: 0,
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.max_entries, 0);
        assert_eq!(config.ttl, 0);
        assert_eq!(config.expiry_mode, ExpiryMode::Lazy);
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.cleanup_interval, 0);
    }

    #[test]
    fn test_config_from_env() {
        env::set_var("MAX_ENTRIES", "25");
        env::set_var("TTL", "60");
        env::set_var("EXPIRY_MODE", "active");
        env::set_var("SERVER_PORT", "not-a-port");
        env::remove_var("CLEANUP_INTERVAL");

        let config = Config::from_env();
        assert_eq!(config.max_entries, 25);
        assert_eq!(config.ttl, 60);
        assert_eq!(config.expiry_mode, ExpiryMode::Active);
        // Unparseable values fall back to the default
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.cleanup_interval, 0);

        for name in ["MAX_ENTRIES", "TTL", "EXPIRY_MODE", "SERVER_PORT"] {
            env::remove_var(name);
        }
    }

    #[test]
    fn test_cache_config_conversion() {
        let config = Config {
            max_entries: 10,
            ttl: 30,
            expiry_mode: ExpiryMode::Active,
            ..Config::default()
        };

        let cache_config = config.cache_config();
        assert_eq!(cache_config.max_entries, 10);
        assert_eq!(cache_config.ttl, Duration::from_secs(30));
        assert_eq!(cache_config.expiry_mode, ExpiryMode::Active);
    }
}
