//! In-memory sliding-window store using dashmap.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use accessgate_core::result::AppResult;

use crate::window::{SlidingWindowStore, WindowState};

/// Per-process hit log keyed by counter key. Reset on restart.
#[derive(Debug, Clone, Default)]
pub struct MemoryWindowStore {
    hits: Arc<DashMap<String, VecDeque<i64>>>,
}

impl MemoryWindowStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop keys with no hits newer than `now_ms - window_ms`.
    pub fn evict_idle(&self, now_ms: i64, window_ms: u64) {
        let cutoff = now_ms - window_ms as i64;
        self.hits
            .retain(|_, log| log.back().is_some_and(|&last| last > cutoff));
    }

    /// Number of tracked keys.
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    /// Whether no keys are tracked.
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

#[async_trait]
impl SlidingWindowStore for MemoryWindowStore {
    async fn hit(
        &self,
        key: &str,
        now_ms: i64,
        window_ms: u64,
        max_requests: u32,
    ) -> AppResult<WindowState> {
        let cutoff = now_ms - window_ms as i64;
        let mut log = self.hits.entry(key.to_string()).or_default();

        while log.front().is_some_and(|&t| t <= cutoff) {
            log.pop_front();
        }

        let allowed = (log.len() as u64) < u64::from(max_requests);
        if allowed {
            log.push_back(now_ms);
        }

        Ok(WindowState {
            allowed,
            count: log.len() as u32,
            oldest_ms: log.front().copied(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rejects_over_limit_within_window() {
        let store = MemoryWindowStore::new();
        for i in 0..3 {
            let state = store.hit("k", 1_000 + i, 1_000, 3).await.expect("hit");
            assert!(state.allowed);
        }
        let state = store.hit("k", 1_500, 1_000, 3).await.expect("hit");
        assert!(!state.allowed);
        assert_eq!(state.count, 3);
        assert_eq!(state.oldest_ms, Some(1_000));
    }

    #[tokio::test]
    async fn test_old_hits_slide_out() {
        let store = MemoryWindowStore::new();
        store.hit("k", 0, 1_000, 1).await.expect("hit");
        assert!(!store.hit("k", 999, 1_000, 1).await.expect("hit").allowed);
        assert!(store.hit("k", 1_000, 1_000, 1).await.expect("hit").allowed);
    }

    #[tokio::test]
    async fn test_keys_are_independent_and_evictable() {
        let store = MemoryWindowStore::new();
        store.hit("a", 0, 1_000, 1).await.expect("hit");
        assert!(store.hit("b", 0, 1_000, 1).await.expect("hit").allowed);
        assert_eq!(store.len(), 2);
        store.evict_idle(5_000, 1_000);
        assert!(store.is_empty());
    }
}
