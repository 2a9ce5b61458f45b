//! Accounting ingestion.

pub mod engine;

pub use engine::{AccountingEngine, AccountingOutcome};
