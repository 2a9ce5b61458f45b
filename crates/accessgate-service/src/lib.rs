//! # accessgate-service
//!
//! Business logic for AccessGate: accounting ingestion, quota enforcement,
//! the control dispatch queue, and session registration. Services depend on
//! the store contracts from `accessgate-database` and on the NAS adapter
//! registry, never on a concrete backend.

pub mod accounting;
pub mod container;
pub mod control;
pub mod policy;
pub mod quota;
pub mod session;

pub use accounting::{AccountingEngine, AccountingOutcome};
pub use container::Services;
pub use control::{ControlDispatchQueue, DispatchResult, DrainReport};
pub use policy::PolicyResolver;
pub use quota::{Enforcement, QuotaDecision, QuotaEnforcer};
pub use session::{SessionDetail, SessionService};
