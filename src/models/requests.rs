//! Request DTOs for the cache server API
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use serde::Deserialize;
use serde_json::Value;

use crate::cache::{Strategy, MAX_KEY_LENGTH};

/// Request body for POST /cache
///
/// The value is opaque JSON; it is stored without inspection.
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    /// The cache key
    pub key: String,
    /// The value to store
    #[serde(default)]
    pub value: Value,
}

impl SetRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.key.is_empty() {
            return Some("Missing cache key".to_string());
        }
        if self.key.len() > MAX_KEY_LENGTH {
            return Some(format!(
                "Key exceeds maximum length of {} bytes",
                MAX_KEY_LENGTH
            ));
        }
        if self.value.is_null() {
            return Some("Missing cache value".to_string());
        }
        None
    }
}

/// Query string for GET /cache/data and DELETE /cache
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeyQuery {
    pub key: Option<String>,
}

/// Query string for GET /items/data
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemQuery {
    pub name: Option<String>,
    /// Overrides the default stale-while-revalidate strategy
    pub strategy: Option<Strategy>,
}
