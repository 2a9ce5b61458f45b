//! Per-source sliding-window rate limiter.

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use accessgate_core::config::rate_limit::RateLimitRuleConfig;
use accessgate_core::result::AppResult;

use crate::keys;
use crate::window::SlidingWindowStore;

/// At most `max_requests` within `window_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitRule {
    pub window_ms: u64,
    pub max_requests: u32,
}

impl From<RateLimitRuleConfig> for RateLimitRule {
    fn from(config: RateLimitRuleConfig) -> Self {
        Self {
            window_ms: config.window_ms,
            max_requests: config.max_requests,
        }
    }
}

/// Outcome of one rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    /// Whether the request may proceed.
    pub allowed: bool,
    /// The rule's `max_requests`.
    pub limit: u32,
    /// Requests left in the current window.
    pub remaining: u32,
    /// Unix seconds at which one more request becomes available.
    pub reset_at: i64,
}

/// Rate limiter for one endpoint group.
///
/// Constructed with its own rule and scope; the counter store is shared
/// and swappable.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn SlidingWindowStore>,
    rule: RateLimitRule,
    scope: String,
}

impl RateLimiter {
    /// Create a limiter for `scope` (e.g. `"accounting"`).
    pub fn new(
        store: Arc<dyn SlidingWindowStore>,
        rule: RateLimitRule,
        scope: impl Into<String>,
    ) -> Self {
        Self {
            store,
            rule,
            scope: scope.into(),
        }
    }

    /// The configured rule.
    pub fn rule(&self) -> RateLimitRule {
        self.rule
    }

    /// Count one request from `source` now.
    pub async fn check(&self, source: &str) -> AppResult<RateLimitDecision> {
        self.check_at(source, Utc::now().timestamp_millis()).await
    }

    /// Count one request from `source` at `now_ms`.
    pub async fn check_at(&self, source: &str, now_ms: i64) -> AppResult<RateLimitDecision> {
        let key = keys::rate_limit(&self.scope, source);
        let state = self
            .store
            .hit(&key, now_ms, self.rule.window_ms, self.rule.max_requests)
            .await?;

        let window_ms = self.rule.window_ms as i64;
        let reset_ms = state.oldest_ms.unwrap_or(now_ms) + window_ms;
        let decision = RateLimitDecision {
            allowed: state.allowed,
            limit: self.rule.max_requests,
            remaining: self.rule.max_requests.saturating_sub(state.count),
            reset_at: (reset_ms + 999).div_euclid(1000),
        };

        if !decision.allowed {
            debug!(scope = %self.scope, source, "Rate limit exceeded");
        }
        Ok(decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryWindowStore;

    fn limiter(max_requests: u32) -> RateLimiter {
        RateLimiter::new(
            Arc::new(MemoryWindowStore::new()),
            RateLimitRule {
                window_ms: 60_000,
                max_requests,
            },
            "control",
        )
    }

    #[tokio::test]
    async fn test_counts_down_then_rejects() {
        let limiter = limiter(2);
        let first = limiter.check_at("10.0.0.9", 1_000).await.expect("check");
        assert!(first.allowed);
        assert_eq!(first.remaining, 1);
        assert_eq!(first.limit, 2);

        let second = limiter.check_at("10.0.0.9", 2_000).await.expect("check");
        assert_eq!(second.remaining, 0);

        let third = limiter.check_at("10.0.0.9", 3_000).await.expect("check");
        assert!(!third.allowed);
        assert_eq!(third.remaining, 0);
        // The first hit at 1s leaves the window at 61s.
        assert_eq!(third.reset_at, 61);
    }

    #[tokio::test]
    async fn test_sources_are_isolated() {
        let limiter = limiter(1);
        assert!(limiter.check_at("a", 0).await.expect("check").allowed);
        assert!(limiter.check_at("b", 0).await.expect("check").allowed);
        assert!(!limiter.check_at("a", 10).await.expect("check").allowed);
    }

    #[tokio::test]
    async fn test_scopes_share_store_without_interfering() {
        let store: Arc<dyn SlidingWindowStore> = Arc::new(MemoryWindowStore::new());
        let rule = RateLimitRule {
            window_ms: 1_000,
            max_requests: 1,
        };
        let accounting = RateLimiter::new(store.clone(), rule, "accounting");
        let control = RateLimiter::new(store, rule, "control");
        assert!(accounting.check_at("nas", 0).await.expect("check").allowed);
        assert!(control.check_at("nas", 0).await.expect("check").allowed);
    }
}
