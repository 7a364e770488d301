//! Cache Policy Module
//!
//! Capacity and expiry settings fixed at construction time.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

// == Expiry Mode ==
/// How an entry's TTL is enforced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryMode {
    /// Liveness is checked by timestamp on read; an expired entry reads as
    /// absent and is physically removed by the next sweep.
    #[default]
    Lazy,
    /// A callback fires when the TTL elapses and refreshes the entry through
    /// the fetch function that last populated it. Entries never populated by
    /// a fetch are removed instead. Reads reschedule the callback.
    Active,
}

impl fmt::Display for ExpiryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpiryMode::Lazy => f.write_str("lazy"),
            ExpiryMode::Active => f.write_str("active"),
        }
    }
}

impl FromStr for ExpiryMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lazy" => Ok(ExpiryMode::Lazy),
            "active" => Ok(ExpiryMode::Active),
            other => Err(format!("unknown expiry mode '{}'", other)),
        }
    }
}

// == Cache Config ==
/// Engine configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of entries, 0 = unbounded
    pub max_entries: usize,
    /// Time-to-live, zero = never expires
    pub ttl: Duration,
    pub expiry_mode: ExpiryMode,
}

impl CacheConfig {
    pub fn new(max_entries: usize, ttl: Duration, expiry_mode: ExpiryMode) -> Self {
        Self {
            max_entries,
            ttl,
            expiry_mode,
        }
    }
}
