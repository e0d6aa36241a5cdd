use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("stored value is not a number: {0}")]
    NotANumber(String),
}

/// Shared key-value store with expiring entries.
/// Backs both the translation cache and the per-caller rate limiter.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Short name reported by the health endpoint.
    fn backend_name(&self) -> &'static str;

    /// `false` for the no-op store, which has nothing to be connected to.
    fn is_configured(&self) -> bool {
        true
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError>;

    /// Add `delta` to the integer at `key` and refresh its expiry.
    /// Returns the new total.
    async fn incr_by_with_ttl(&self, key: &str, delta: u64, ttl: Duration)
        -> Result<u64, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}
