//! NAS device entity model.

use accessgate_core::types::NasDeviceId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A network access server known to AccessGate.
///
/// `connection_method` selects which adapter delivers control commands to
/// this device.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct NasDevice {
    /// Device identifier.
    pub id: NasDeviceId,
    /// Address the device reports as `NAS-IP-Address`.
    pub nas_ip_address: String,
    /// Display name.
    pub name: String,
    /// Adapter tag, e.g. `mikrotik` or `simulated`.
    pub connection_method: String,
    /// Disabled devices are routed to the default adapter.
    pub enabled: bool,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
}
