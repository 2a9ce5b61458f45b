//! Quota evaluation and enforcement.

pub mod enforcer;

pub use enforcer::{Enforcement, QuotaBreach, QuotaDecision, QuotaEnforcer};
