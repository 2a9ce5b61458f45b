//! PostgreSQL repository implementations, one per table.

pub mod control_request;
pub mod nas_device;
pub mod profile;
pub mod session;

pub use control_request::ControlRequestRepository;
pub use nas_device::NasDeviceRepository;
pub use profile::ProfileRepository;
pub use session::SessionRepository;
