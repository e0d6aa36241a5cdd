use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::interface::{TranslationRequest, TranslationResult, TranslationStatus, Translator};
use super::language::LanguageResolver;
use crate::cache::{fingerprint, CacheEntry, TranslationCache};
use crate::error::{epoch_seconds, TranslateError};
use crate::rate_limit::{Admission, RateLimiter};

/// Whitespace-delimited token count, the unit of the usage budget.
pub fn count_tokens(text: &str) -> u64 {
    text.split_whitespace().count() as u64
}

/// Runs a validated request through limiter, cache, language resolution
/// and the upstream model, and assembles the response.
pub struct TranslationService {
    limiter: RateLimiter,
    cache: TranslationCache,
    resolver: LanguageResolver,
    translator: Arc<dyn Translator>,
}

impl TranslationService {
    pub fn new(
        limiter: RateLimiter,
        cache: TranslationCache,
        resolver: LanguageResolver,
        translator: Arc<dyn Translator>,
    ) -> Self {
        Self {
            limiter,
            cache,
            resolver,
            translator,
        }
    }

    pub fn translator(&self) -> &Arc<dyn Translator> {
        &self.translator
    }

    pub async fn process(&self, request: TranslationRequest) -> Result<TranslationResult, TranslateError> {
        let request_id = Uuid::new_v4();
        debug!(
            %request_id,
            caller = %request.caller_identity,
            force_refresh = request.force_refresh,
            "Processing translation to {}",
            request.target_language
        );

        if !self.translator.is_configured() {
            return Err(TranslateError::missing_api_key());
        }

        match self.limiter.admit(&request.caller_identity).await {
            Admission::Allowed => {}
            denied @ Admission::Throttled { .. } => {
                return Err(TranslateError::RateLimited {
                    caller: request.caller_identity.clone(),
                    details: denied.reason().unwrap_or_default(),
                });
            }
            denied @ Admission::BudgetExhausted { .. } => {
                return Err(TranslateError::TokenLimit {
                    caller: request.caller_identity.clone(),
                    details: denied.reason().unwrap_or_default(),
                });
            }
        }

        let key = fingerprint(&request.text, &request.target_language);

        if !request.force_refresh {
            if let Some(entry) = self.cache.get(&key).await {
                info!(%request_id, "Serving cached translation");
                return Ok(TranslationResult {
                    source_language: entry.source_language,
                    target_language: request.target_language,
                    translated_text: entry.translated_text,
                    status: TranslationStatus::Cached,
                    tokens_used: None,
                    cache_timestamp: Some(entry.created_at),
                    cache_available: None,
                });
            }
        }

        let source_language = self
            .resolver
            .resolve(&request.text, request.source_language_override.as_deref());

        let translated_text = self
            .translator
            .translate(&source_language, &request.target_language, &request.text)
            .await
            .inspect_err(|e| warn!(%request_id, kind = e.kind().as_str(), "Translation failed: {}", e))?;

        let tokens_used = count_tokens(&request.text) + count_tokens(&translated_text);
        self.limiter
            .record_usage(&request.caller_identity, tokens_used)
            .await;

        let entry = CacheEntry {
            source_language: source_language.clone(),
            translated_text: translated_text.clone(),
            created_at: epoch_seconds(),
            model_identifier: self.translator.model().to_string(),
            tokens_used: Some(tokens_used),
        };
        let cache_available = self.cache.put(&key, &entry).await;

        let status = if request.force_refresh {
            TranslationStatus::Regenerated
        } else {
            TranslationStatus::Generated
        };
        info!(%request_id, tokens_used, ?status, "Translated {} -> {}", source_language, request.target_language);

        Ok(TranslationResult {
            source_language,
            target_language: request.target_language,
            translated_text,
            status,
            tokens_used: Some(tokens_used),
            cache_timestamp: None,
            cache_available: Some(cache_available),
        })
    }
}
