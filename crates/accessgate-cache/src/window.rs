//! Sliding-window counter store contract.

use async_trait::async_trait;

use accessgate_core::result::AppResult;

/// Window state after one recorded attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowState {
    /// Whether the attempt fit in the window and was counted.
    pub allowed: bool,
    /// Hits inside the window after this attempt.
    pub count: u32,
    /// Timestamp (unix ms) of the oldest hit still in the window.
    pub oldest_ms: Option<i64>,
}

/// Storage for per-key hit timestamps.
///
/// A hit at `now_ms` is counted only if fewer than `max_requests` hits fall in
/// `(now_ms - window_ms, now_ms]`. Rejected attempts are not recorded, so a
/// client that backs off regains budget as old hits age out.
#[async_trait]
pub trait SlidingWindowStore: Send + Sync + 'static {
    /// Atomically prune, check and record one attempt for `key`.
    async fn hit(
        &self,
        key: &str,
        now_ms: i64,
        window_ms: u64,
        max_requests: u32,
    ) -> AppResult<WindowState>;
}
