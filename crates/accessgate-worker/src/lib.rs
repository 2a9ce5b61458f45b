//! Background work for AccessGate.
//!
//! This crate provides:
//! - A dispatch runner that drains the control queue on a fixed interval
//! - A cron scheduler for the stale-`sent` sweep and the stale-session reaper

pub mod runner;
pub mod scheduler;

pub use runner::DispatchRunner;
pub use scheduler::CronScheduler;
