//! Accounting event value objects.

pub mod event;

pub use event::{AccountingEvent, AccountingStatusType, NasMeta};
