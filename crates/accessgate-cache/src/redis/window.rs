//! Redis sliding-window store using a sorted set per key.

use async_trait::async_trait;
use uuid::Uuid;

use accessgate_core::result::AppResult;

use super::client::RedisClient;
use crate::window::{SlidingWindowStore, WindowState};

/// Lua script for an atomic prune-check-record.
///
/// KEYS[1] = sorted set of hit timestamps
/// ARGV[1] = now (ms)
/// ARGV[2] = window (ms)
/// ARGV[3] = max requests
/// ARGV[4] = unique member for this hit
///
/// Returns `{allowed (0|1), count, oldest_ms (-1 if empty)}`.
const HIT_SCRIPT: &str = r#"
    local key = KEYS[1]
    local now = tonumber(ARGV[1])
    local window = tonumber(ARGV[2])
    local max = tonumber(ARGV[3])

    redis.call('ZREMRANGEBYSCORE', key, '-inf', now - window)
    local count = redis.call('ZCARD', key)

    local allowed = 0
    if count < max then
        redis.call('ZADD', key, now, ARGV[4])
        count = count + 1
        allowed = 1
    end
    redis.call('PEXPIRE', key, window)

    local oldest = redis.call('ZRANGE', key, 0, 0, 'WITHSCORES')
    local oldest_ms = -1
    if oldest[2] then
        oldest_ms = tonumber(oldest[2])
    end
    return {allowed, count, oldest_ms}
"#;

/// Counters shared across every AccessGate node.
#[derive(Clone)]
pub struct RedisWindowStore {
    client: RedisClient,
}

impl RedisWindowStore {
    /// Create a store over an established client.
    pub fn new(client: RedisClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SlidingWindowStore for RedisWindowStore {
    async fn hit(
        &self,
        key: &str,
        now_ms: i64,
        window_ms: u64,
        max_requests: u32,
    ) -> AppResult<WindowState> {
        let mut conn = self.client.conn();
        let member = format!("{now_ms}-{}", Uuid::new_v4().simple());

        let (allowed, count, oldest_ms): (i64, i64, i64) = redis::Script::new(HIT_SCRIPT)
            .key(self.client.prefixed_key(key))
            .arg(now_ms)
            .arg(window_ms)
            .arg(max_requests)
            .arg(member)
            .invoke_async(&mut conn)
            .await?;

        Ok(WindowState {
            allowed: allowed == 1,
            count: count.max(0) as u32,
            oldest_ms: (oldest_ms >= 0).then_some(oldest_ms),
        })
    }
}
