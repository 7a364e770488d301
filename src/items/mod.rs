//! Items Module
//!
//! Item lookups served through the cache engine. The repository stands in
//! for the remote document store; the service wraps its lookups as fetch
//! functions.

mod repository;
mod service;

pub use repository::{InMemoryItemRepository, Item, ItemRepository};
pub use service::ItemService;
