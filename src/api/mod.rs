//! API Module
//!
//! HTTP handlers and routing over the cache engine.
//!
//! # Endpoints
//! - `GET /cache/keys` - List stored keys
//! - `GET /cache/data?key=KEY` - Retrieve a value by key
//! - `POST /cache` - Store a key-value pair
//! - `DELETE /cache[?key=KEY]` - Delete one key, or all keys
//! - `GET /items/data?name=NAME` - Cached item lookup
//! - `GET /stats` - Cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
