//! Ingress rate limiting configuration.

use serde::{Deserialize, Serialize};

/// Backing store for sliding-window counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateLimitBackend {
    /// Per-process counters.
    #[default]
    Memory,
    /// Shared counters in Redis.
    Redis,
}

/// Per-source rate limits for the two ingress groups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Whether rate limiting is applied at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Counter store.
    #[serde(default)]
    pub backend: RateLimitBackend,
    /// Limit for `POST /api/radius/accounting`.
    #[serde(default = "default_accounting")]
    pub accounting: RateLimitRuleConfig,
    /// Limit for the control-admin routes.
    #[serde(default = "default_control")]
    pub control: RateLimitRuleConfig,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: RateLimitBackend::default(),
            accounting: default_accounting(),
            control: default_control(),
        }
    }
}

/// A sliding window: at most `max_requests` within `window_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitRuleConfig {
    /// Window length in milliseconds.
    pub window_ms: u64,
    /// Requests allowed per window.
    pub max_requests: u32,
}

fn default_true() -> bool {
    true
}

fn default_accounting() -> RateLimitRuleConfig {
    RateLimitRuleConfig {
        window_ms: 60_000,
        max_requests: 600,
    }
}

fn default_control() -> RateLimitRuleConfig {
    RateLimitRuleConfig {
        window_ms: 60_000,
        max_requests: 30,
    }
}
