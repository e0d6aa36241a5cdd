use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::TranslateError;

/// A validated translate call.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationRequest {
    pub text: String,
    pub target_language: String,
    pub source_language_override: Option<String>,
    /// Originating address, first `X-Forwarded-For` hop when present.
    pub caller_identity: String,
    /// Skip the cache read. The cache write still happens.
    pub force_refresh: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranslationStatus {
    Generated,
    Regenerated,
    Cached,
}

/// Success envelope returned to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationResult {
    pub source_language: String,
    pub target_language: String,
    pub translated_text: String,
    pub status: TranslationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u64>,
    /// Creation time of the entry a cached answer came from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_timestamp: Option<f64>,
    /// Whether a fresh result made it into the cache.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_available: Option<bool>,
}

/// Upstream model that turns text into its translation
#[async_trait]
pub trait Translator: Send + Sync {
    /// Identifier recorded alongside cached results.
    fn model(&self) -> &str;

    /// `false` when no credential is set; callers fail fast without a network attempt.
    fn is_configured(&self) -> bool;

    async fn translate(
        &self,
        source_language: &str,
        target_language: &str,
        text: &str,
    ) -> Result<String, TranslateError>;
}
