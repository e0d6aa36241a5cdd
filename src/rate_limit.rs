use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::LimitsConfig;
use crate::store::{KeyValueStore, StoreError};

const USAGE_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);

/// Outcome of an admission check.
#[derive(Debug, Clone, PartialEq)]
pub enum Admission {
    Allowed,
    /// The caller's previous request was too recent.
    Throttled { wait: Duration },
    /// The caller's rolling usage reached the ceiling.
    BudgetExhausted { used: u64, ceiling: u64 },
}

impl Admission {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Admission::Allowed)
    }

    /// Human-readable hint for denied requests.
    pub fn reason(&self) -> Option<String> {
        match self {
            Admission::Allowed => None,
            Admission::Throttled { wait } => Some(format!(
                "Wait {:.1} seconds before next request",
                wait.as_secs_f64()
            )),
            Admission::BudgetExhausted { used, ceiling } => {
                Some(format!("Token limit reached ({}/{})", used, ceiling))
            }
        }
    }
}

/// Per-caller minimum interval plus rolling usage ceiling, kept in the
/// shared store. Fails open when the store misbehaves.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn KeyValueStore>,
    min_interval: Duration,
    token_budget: u64,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn KeyValueStore>, limits: &LimitsConfig) -> Self {
        Self {
            store,
            min_interval: limits.rate_limit_interval(),
            token_budget: limits.token_budget,
        }
    }

    fn interval_key(caller: &str) -> String {
        format!("rate_limit:{}", caller)
    }

    fn usage_key(caller: &str) -> String {
        format!("token_limit:{}", caller)
    }

    pub async fn admit(&self, caller: &str) -> Admission {
        self.admit_at(caller, chrono::Utc::now().timestamp_millis()).await
    }

    /// Admission check against an explicit clock reading (epoch millis).
    pub async fn admit_at(&self, caller: &str, now_ms: i64) -> Admission {
        match self.check(caller, now_ms).await {
            Ok(admission) => admission,
            Err(e) => {
                warn!("Rate limit check failed for {}, allowing: {}", caller, e);
                Admission::Allowed
            }
        }
    }

    async fn check(&self, caller: &str, now_ms: i64) -> Result<Admission, StoreError> {
        let interval_ms = self.min_interval.as_millis() as i64;

        if let Some(raw) = self.store.get(&Self::interval_key(caller)).await? {
            let last_ms: i64 = raw.parse().map_err(|_| StoreError::NotANumber(raw.clone()))?;
            let elapsed = now_ms - last_ms;
            if elapsed < interval_ms {
                let wait = Duration::from_millis((interval_ms - elapsed.max(0)) as u64);
                debug!("Throttling {}: {}ms since last request", caller, elapsed);
                return Ok(Admission::Throttled { wait });
            }
        }

        if let Some(raw) = self.store.get(&Self::usage_key(caller)).await? {
            let used: u64 = raw.parse().map_err(|_| StoreError::NotANumber(raw.clone()))?;
            if used >= self.token_budget {
                return Ok(Admission::BudgetExhausted {
                    used,
                    ceiling: self.token_budget,
                });
            }
        }

        self.store
            .set_with_ttl(&Self::interval_key(caller), &now_ms.to_string(), self.min_interval * 2)
            .await?;
        Ok(Admission::Allowed)
    }

    /// Add the cost of a completed request to the caller's usage. Non-fatal.
    pub async fn record_usage(&self, caller: &str, tokens: u64) {
        match self
            .store
            .incr_by_with_ttl(&Self::usage_key(caller), tokens, USAGE_WINDOW)
            .await
        {
            Ok(total) => debug!("Usage for {} is now {}", caller, total),
            Err(e) => warn!("Failed to record usage for {}: {}", caller, e),
        }
    }
}
