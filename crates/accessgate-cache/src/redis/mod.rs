//! Redis-backed counter store.

pub mod client;
pub mod window;

pub use client::RedisClient;
pub use window::RedisWindowStore;
