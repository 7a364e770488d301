//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use serde_json::Value;

use crate::cache::Cache;
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::items::{InMemoryItemRepository, Item, ItemRepository, ItemService};
use crate::models::{
    DeleteResponse, GetResponse, HealthResponse, ItemQuery, KeyQuery, SetRequest, SetResponse,
    StatsResponse,
};

/// Application state shared across all handlers.
///
/// Both caches are cheaply cloneable handles over shared stores.
#[derive(Clone)]
pub struct AppState {
    /// General-purpose cache of opaque JSON values
    pub cache: Cache<Value>,
    /// Cached item lookups
    pub items: ItemService,
}

impl AppState {
    pub fn new(cache: Cache<Value>, items: ItemService) -> Self {
        Self { cache, items }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Both caches share the configured capacity and expiry policy.
    pub fn from_config(config: &Config, repo: Arc<dyn ItemRepository>) -> Self {
        let cache_config = config.cache_config();
        Self::new(
            Cache::new(cache_config),
            ItemService::new(Cache::new(cache_config), repo),
        )
    }

    /// Default-configured state backed by an empty in-memory repository.
    pub fn in_memory() -> Self {
        Self::from_config(&Config::default(), Arc::new(InMemoryItemRepository::new()))
    }
}

/// Handler for GET /cache/keys
pub async fn keys_handler(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.cache.get_keys().await)
}

/// Handler for GET /cache/data?key=KEY
pub async fn get_handler(
    State(state): State<AppState>,
    Query(query): Query<KeyQuery>,
) -> Result<Json<GetResponse>> {
    let key = query
        .key
        .ok_or_else(|| CacheError::InvalidArgument("Missing cache key".to_string()))?;

    let value = state.cache.get(&key).await?;
    Ok(Json(GetResponse::new(key, value)))
}

/// Handler for POST /cache
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidArgument(error_msg));
    }

    state.cache.set(&req.key, req.value).await?;
    Ok(Json(SetResponse::new(req.key)))
}

/// Handler for DELETE /cache[?key=KEY]
///
/// Deletes one key when given, otherwise every key.
pub async fn delete_handler(
    State(state): State<AppState>,
    Query(query): Query<KeyQuery>,
) -> Json<DeleteResponse> {
    match query.key {
        Some(key) => {
            state.cache.del(&key).await;
            Json(DeleteResponse::key(key))
        }
        None => {
            state.cache.del_all().await;
            Json(DeleteResponse::all())
        }
    }
}

/// Handler for GET /items/data?name=NAME[&strategy=STRATEGY]
pub async fn items_handler(
    State(state): State<AppState>,
    Query(query): Query<ItemQuery>,
) -> Result<Json<Vec<Item>>> {
    let name = query
        .name
        .ok_or_else(|| CacheError::InvalidArgument("Missing item name".to_string()))?;
    let strategy = query.strategy.unwrap_or(ItemService::DEFAULT_STRATEGY);

    let items = state.items.find_by_name(&name, strategy).await?;
    if items.is_empty() {
        return Err(CacheError::NotFound(format!("Item not found: {}", name)));
    }
    Ok(Json(items))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(state.cache.stats().await.into())
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
