//! Control dispatch queue.

pub mod queue;
pub mod report;

pub use queue::ControlDispatchQueue;
pub use report::{DispatchResult, DrainReport};
