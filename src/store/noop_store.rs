use async_trait::async_trait;
use std::time::Duration;

use super::interface::{KeyValueStore, StoreError};

/// Stand-in used when no store is configured or reachable.
/// Reads always miss and writes vanish, which makes the cache and the
/// limiter permissive.
#[derive(Debug, Default, Clone)]
pub struct NoopStore;

#[async_trait]
impl KeyValueStore for NoopStore {
    fn backend_name(&self) -> &'static str {
        "none"
    }

    fn is_configured(&self) -> bool {
        false
    }

    async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Ok(None)
    }

    async fn set_with_ttl(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), StoreError> {
        Ok(())
    }

    async fn incr_by_with_ttl(&self, _key: &str, delta: u64, _ttl: Duration) -> Result<u64, StoreError> {
        Ok(delta)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
