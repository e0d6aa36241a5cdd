use std::sync::Arc;

use crate::cache::TranslationCache;
use crate::config::Config;
use crate::rate_limit::RateLimiter;
use crate::store::{KeyValueStore, StoreFactory};
use crate::translate::{GroqTranslator, LanguageResolver, TranslationService, Translator};
use crate::validation::RequestValidator;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn KeyValueStore>,
    pub validator: RequestValidator,
    pub service: Arc<TranslationService>,
}

impl AppState {
    /// Wire the production collaborators: the configured store and the
    /// Groq chat-completion client.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = StoreFactory::create_store(&config.cache).await;
        let translator: Arc<dyn Translator> = Arc::new(GroqTranslator::new(&config.upstream)?);
        Ok(Self::with_parts(config, store, translator, LanguageResolver::default()))
    }

    pub fn with_parts(
        config: Config,
        store: Arc<dyn KeyValueStore>,
        translator: Arc<dyn Translator>,
        resolver: LanguageResolver,
    ) -> Self {
        let service = TranslationService::new(
            RateLimiter::new(store.clone(), &config.limits),
            TranslationCache::new(store.clone(), config.cache.ttl()),
            resolver,
            translator,
        );

        Self {
            validator: RequestValidator::new(config.limits.max_text_length),
            config: Arc::new(config),
            store,
            service: Arc::new(service),
        }
    }
}
