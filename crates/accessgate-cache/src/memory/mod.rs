//! In-process counter store.

pub mod window;

pub use window::MemoryWindowStore;
