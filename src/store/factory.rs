use std::sync::Arc;
use tracing::{info, warn};

use crate::config::{CacheConfig, StoreBackend};
use super::interface::KeyValueStore;
use super::memory_store::MemoryStore;
use super::noop_store::NoopStore;
use super::redis_store::RedisStore;

/// Picks the store once at startup. Request handling never checks
/// whether a store is configured; an absent one is a `NoopStore`.
pub struct StoreFactory;

impl StoreFactory {
    pub async fn create_store(cache_config: &CacheConfig) -> Arc<dyn KeyValueStore> {
        match cache_config.resolved_backend() {
            StoreBackend::Redis => {
                let Some(url) = cache_config.redis_url.as_deref() else {
                    warn!("Redis backend selected without a redis_url; caching and rate limiting disabled");
                    return Arc::new(NoopStore);
                };
                match RedisStore::connect(url).await {
                    Ok(store) => Arc::new(store),
                    Err(e) => {
                        warn!("Redis unavailable ({}); caching and rate limiting disabled", e);
                        Arc::new(NoopStore)
                    }
                }
            }
            StoreBackend::Memory => {
                info!("Using in-memory store");
                Arc::new(MemoryStore::new())
            }
            StoreBackend::None => {
                info!("No store configured; caching and rate limiting disabled");
                Arc::new(NoopStore)
            }
        }
    }
}
