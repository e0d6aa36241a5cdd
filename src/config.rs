use serde::{Deserialize, Serialize};
use std::time::Duration;
use anyhow::Result;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub limits: LimitsConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory with the playground page, served as the router fallback.
    pub static_dir: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            static_dir: Some("public".to_string()),
        }
    }
}

/// Chat-completion endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_tokens_per_request: u32,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.groq.com/openai/v1/chat/completions".to_string(),
            api_key: None,
            model: "llama-3.1-8b-instant".to_string(),
            temperature: 0.2,
            timeout_secs: 30,
            max_retries: 5,
            base_delay_ms: 500,
            max_tokens_per_request: 300,
        }
    }
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_text_length: usize,
    pub rate_limit_interval_ms: u64,
    /// Rolling 24h usage ceiling per caller, in whitespace tokens.
    pub token_budget: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_text_length: 2000,
            rate_limit_interval_ms: 2000,
            token_budget: 300,
        }
    }
}

impl LimitsConfig {
    pub fn rate_limit_interval(&self) -> Duration {
        Duration::from_millis(self.rate_limit_interval_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Redis,
    Memory,
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Defaults to `redis` when a URL is present, `none` otherwise.
    pub backend: Option<StoreBackend>,
    pub redis_url: Option<String>,
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: None,
            redis_url: None,
            ttl_secs: 60 * 60 * 24 * 7,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn resolved_backend(&self) -> StoreBackend {
        match self.backend {
            Some(backend) => backend,
            None if self.redis_url.is_some() => StoreBackend::Redis,
            None => StoreBackend::None,
        }
    }
}

impl Config {
    /// Layer defaults, an optional config file and `TRANSLATOR_*` variables,
    /// then the deployment's legacy variable names on top.
    pub fn load(path: &str) -> Result<Self> {
        let layered = ::config::Config::builder()
            .add_source(::config::File::with_name(path).required(false))
            .add_source(
                ::config::Environment::with_prefix("TRANSLATOR")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut config: Config = layered.try_deserialize()?;
        config.apply_legacy_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    fn apply_legacy_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty("GROQ_API_KEY") {
            self.upstream.api_key = Some(key);
        }
        if let Some(model) = non_empty("GROQ_MODEL") {
            self.upstream.model = model;
        }
        if let Some(url) = non_empty("REDIS_URL_REDIS_URL").or_else(|| non_empty("REDIS_URL")) {
            self.cache.redis_url = Some(url);
        }
    }
}
