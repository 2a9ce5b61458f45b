//! # accessgate-cache
//!
//! Sliding-window request counters used to rate-limit ingress. Two stores
//! implement [`window::SlidingWindowStore`]:
//!
//! - **memory**: per-process counters in a [dashmap](https://crates.io/crates/dashmap)
//! - **redis**: shared counters in sorted sets, updated by a Lua script
//!
//! [`limiter::RateLimiter`] sits on top and is constructed once per endpoint
//! group with its own rule.

pub mod keys;
pub mod limiter;
#[cfg(feature = "memory")]
pub mod memory;
#[cfg(feature = "redis-backend")]
pub mod redis;
pub mod window;

pub use limiter::{RateLimitDecision, RateLimitRule, RateLimiter};
pub use window::{SlidingWindowStore, WindowState};
