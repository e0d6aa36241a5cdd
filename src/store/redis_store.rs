use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use std::time::Duration;
use tracing::info;

use super::interface::{KeyValueStore, StoreError};

/// Redis-backed store shared by every service instance.
///
/// Each operation opens its own multiplexed connection from the client, so
/// a Redis restart only fails the calls made while the server is down.
#[derive(Clone)]
pub struct RedisStore {
    client: redis::Client,
}

impl RedisStore {
    /// Parse the URL without touching the network.
    pub fn new(url: &str) -> Result<Self, StoreError> {
        Ok(Self {
            client: redis::Client::open(url)?,
        })
    }

    /// Build the store and verify the server answers.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let store = Self::new(url)?;
        store.ping().await?;
        info!("Connected to redis store");
        Ok(store)
    }

    async fn connection(&self) -> Result<MultiplexedConnection, redis::RedisError> {
        self.client.get_multiplexed_async_connection().await
    }
}

fn ttl_millis(ttl: Duration) -> u64 {
    (ttl.as_millis() as u64).max(1)
}

#[async_trait]
impl KeyValueStore for RedisStore {
    fn backend_name(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.connection().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        let _: () = conn.pset_ex(key, value, ttl_millis(ttl)).await?;
        Ok(())
    }

    async fn incr_by_with_ttl(&self, key: &str, delta: u64, ttl: Duration) -> Result<u64, StoreError> {
        let mut conn = self.connection().await?;
        let (total,): (u64,) = redis::pipe()
            .atomic()
            .incr(key, delta)
            .pexpire(key, ttl_millis(ttl) as i64)
            .ignore()
            .query_async(&mut conn)
            .await?;
        Ok(total)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        let _: Option<String> = conn.get("translator:__ping__").await?;
        Ok(())
    }
}
