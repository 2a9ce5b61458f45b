//! RADIUS session domain entities.

pub mod counters;
pub mod model;
pub mod state;
pub mod terminate_cause;

pub use counters::{CounterUpdate, combine_octets};
pub use model::{NewSession, RadiusSession, SessionUsage};
pub use state::SessionState;
pub use terminate_cause::TerminateCause;
