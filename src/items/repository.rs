//! Item Repository
//!
//! Remote item lookups behind an async trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// A stored item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub color: String,
}

impl Item {
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
        }
    }
}

/// Source of items, typically a remote database.
#[async_trait]
pub trait ItemRepository: Send + Sync {
    /// All items whose name equals `name`.
    async fn find_by_name(&self, name: &str) -> anyhow::Result<Vec<Item>>;
}

/// Process-local repository.
#[derive(Debug, Default)]
pub struct InMemoryItemRepository {
    items: RwLock<Vec<Item>>,
}

impl InMemoryItemRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(items: impl IntoIterator<Item = Item>) -> Self {
        Self {
            items: RwLock::new(items.into_iter().collect()),
        }
    }

    pub async fn insert(&self, item: Item) {
        self.items.write().await.push(item);
    }
}

#[async_trait]
impl ItemRepository for InMemoryItemRepository {
    async fn find_by_name(&self, name: &str) -> anyhow::Result<Vec<Item>> {
        Ok(self
            .items
            .read()
            .await
            .iter()
            .filter(|item| item.name == name)
            .cloned()
            .collect())
    }
}
