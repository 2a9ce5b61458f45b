//! Access profile entity model.

use accessgate_core::config::profiles::ProfileSeed;
use accessgate_core::types::ProfileId;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A named access policy. Read-only to AccessGate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct AccessProfile {
    /// Profile identifier.
    pub id: ProfileId,
    /// Profile name.
    pub name: String,
    /// Data quota in megabytes (None = unlimited).
    pub quota_data_mb: Option<i64>,
    /// Time quota in minutes (None = unlimited).
    pub quota_time_minutes: Option<i64>,
    /// Upload bandwidth in kbps.
    pub bandwidth_up_kbps: Option<i32>,
    /// Download bandwidth in kbps.
    pub bandwidth_down_kbps: Option<i32>,
}

impl AccessProfile {
    /// Check whether neither quota is set.
    pub fn is_unlimited(&self) -> bool {
        self.quota_data_mb.is_none() && self.quota_time_minutes.is_none()
    }
}

impl From<ProfileSeed> for AccessProfile {
    fn from(seed: ProfileSeed) -> Self {
        Self {
            id: seed.id,
            name: seed.name,
            quota_data_mb: seed.quota_data_mb,
            quota_time_minutes: seed.quota_time_minutes,
            bandwidth_up_kbps: seed.bandwidth_up_kbps,
            bandwidth_down_kbps: seed.bandwidth_down_kbps,
        }
    }
}
