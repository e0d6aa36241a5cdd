use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::interface::{KeyValueStore, StoreError};

struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

const SWEEP_EVERY_WRITES: u64 = 1024;

/// In-process store for single-instance runs and tests.
/// Expired entries are dropped on access, and every `sweep_every` writes
/// the whole map is swept so keys that are never read again don't pile up.
#[derive(Clone)]
pub struct MemoryStore {
    entries: Arc<DashMap<String, Entry>>,
    writes: Arc<AtomicU64>,
    sweep_every: u64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::with_sweep_every(SWEEP_EVERY_WRITES)
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sweep_every(writes: u64) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            writes: Arc::new(AtomicU64::new(0)),
            sweep_every: writes.max(1),
        }
    }

    /// Drop every expired entry.
    pub fn purge_expired(&self) {
        self.entries.retain(|_, entry| entry.is_live());
    }

    fn record_write(&self) {
        let writes = self.writes.fetch_add(1, Ordering::Relaxed) + 1;
        if writes % self.sweep_every == 0 {
            self.purge_expired();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.value().is_live()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        if let Some(entry) = self.entries.get(key) {
            if entry.is_live() {
                return Ok(Some(entry.value.clone()));
            }
        }
        self.entries.remove_if(key, |_, entry| !entry.is_live());
        Ok(None)
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        self.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        self.record_write();
        Ok(())
    }

    async fn incr_by_with_ttl(&self, key: &str, delta: u64, ttl: Duration) -> Result<u64, StoreError> {
        let total = {
            let mut entry = self.entries.entry(key.to_string()).or_insert_with(|| Entry {
                value: "0".to_string(),
                expires_at: Instant::now() + ttl,
            });

            let current = if entry.is_live() {
                entry
                    .value
                    .parse::<u64>()
                    .map_err(|_| StoreError::NotANumber(entry.value.clone()))?
            } else {
                0
            };
            let total = current + delta;
            entry.value = total.to_string();
            entry.expires_at = Instant::now() + ttl;
            total
        };
        // The shard lock must be released before sweeping.
        self.record_write();
        Ok(total)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
