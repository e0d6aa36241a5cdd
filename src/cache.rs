use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::ErrorKind;
use crate::store::{KeyValueStore, StoreError};

/// A previously produced translation, stored as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub source_language: String,
    pub translated_text: String,
    #[serde(rename = "timestamp")]
    pub created_at: f64,
    #[serde(rename = "model")]
    pub model_identifier: String,
    #[serde(default)]
    pub tokens_used: Option<u64>,
}

/// Deterministic key for a `(text, target language)` pair.
/// No normalisation: whitespace and case differences give distinct keys.
pub fn fingerprint(text: &str, target_language: &str) -> String {
    let mut hasher = Sha256::new();
    // Length prefixes keep ("ab", "c") and ("a", "bc") apart.
    hasher.update((text.len() as u64).to_le_bytes());
    hasher.update(text.as_bytes());
    hasher.update((target_language.len() as u64).to_le_bytes());
    hasher.update(target_language.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Best-effort translation cache. Store faults are logged and treated as
/// a miss on read and a no-op on write.
#[derive(Clone)]
pub struct TranslationCache {
    store: Arc<dyn KeyValueStore>,
    ttl: Duration,
}

impl TranslationCache {
    pub fn new(store: Arc<dyn KeyValueStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    fn key(fingerprint: &str) -> String {
        format!("translation:{}", fingerprint)
    }

    pub async fn get(&self, fingerprint: &str) -> Option<CacheEntry> {
        match self.try_get(fingerprint).await {
            Ok(entry) => entry,
            Err(e) => {
                warn!(kind = ErrorKind::CacheError.as_str(), "Cache read failed for {}: {}", fingerprint, e);
                None
            }
        }
    }

    async fn try_get(&self, fingerprint: &str) -> Result<Option<CacheEntry>, StoreError> {
        let Some(raw) = self.store.get(&Self::key(fingerprint)).await? else {
            return Ok(None);
        };
        let entry: CacheEntry = serde_json::from_str(&raw)?;
        debug!("Cache hit for {}", fingerprint);
        Ok(Some(entry))
    }

    /// Returns whether the entry was written.
    pub async fn put(&self, fingerprint: &str, entry: &CacheEntry) -> bool {
        if !self.store.is_configured() {
            return false;
        }
        let result = match serde_json::to_string(entry) {
            Ok(raw) => self.store.set_with_ttl(&Self::key(fingerprint), &raw, self.ttl).await,
            Err(e) => Err(e.into()),
        };
        match result {
            Ok(()) => true,
            Err(e) => {
                warn!(kind = ErrorKind::CacheError.as_str(), "Cache write failed for {}: {}", fingerprint, e);
                false
            }
        }
    }
}
