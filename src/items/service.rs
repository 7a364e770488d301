//! Item Service
//!
//! Serves item lookups through the cache, stale-while-revalidate by default.

use std::sync::Arc;

use crate::cache::{fetcher, Cache, Strategy};
use crate::error::{CacheError, Result};
use crate::items::{Item, ItemRepository};

/// Cached front for an [`ItemRepository`].
#[derive(Clone)]
pub struct ItemService {
    cache: Cache<Vec<Item>>,
    repo: Arc<dyn ItemRepository>,
}

impl ItemService {
    pub const DEFAULT_STRATEGY: Strategy = Strategy::StaleWhileRevalidate;

    pub fn new(cache: Cache<Vec<Item>>, repo: Arc<dyn ItemRepository>) -> Self {
        Self { cache, repo }
    }

    pub fn cache(&self) -> &Cache<Vec<Item>> {
        &self.cache
    }

    /// Looks up items by name through `strategy`.
    pub async fn find_by_name(&self, name: &str, strategy: Strategy) -> Result<Vec<Item>> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CacheError::InvalidArgument("Invalid item name".to_string()));
        }

        let repo = self.repo.clone();
        let owned = name.to_string();
        let fetch = fetcher(move || {
            let repo = repo.clone();
            let name = owned.clone();
            async move { repo.find_by_name(&name).await }
        });

        self.cache
            .get_with(&cache_key(name), Some(fetch), strategy)
            .await
    }
}

fn cache_key(name: &str) -> String {
    format!("findItemByName?name={}", name)
}
