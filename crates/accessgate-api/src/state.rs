//! Shared application state for Axum handlers.

use std::sync::Arc;
use std::time::Instant;

use accessgate_cache::RateLimiter;
use accessgate_core::config::AppConfig;
use accessgate_service::Services;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Application services
    pub services: Services,
    /// Limiter for `POST /api/radius/accounting`
    pub accounting_limiter: Option<RateLimiter>,
    /// Stricter limiter shared by the control-admin routes
    pub control_limiter: Option<RateLimiter>,
    /// Process start, for uptime
    pub started_at: Instant,
}

impl AppState {
    /// Create state. Limiters are `None` when rate limiting is disabled.
    pub fn new(
        config: Arc<AppConfig>,
        services: Services,
        accounting_limiter: Option<RateLimiter>,
        control_limiter: Option<RateLimiter>,
    ) -> Self {
        Self {
            config,
            services,
            accounting_limiter,
            control_limiter,
            started_at: Instant::now(),
        }
    }
}
