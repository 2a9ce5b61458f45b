//! Access profile seed data for the in-memory backend.

use serde::{Deserialize, Serialize};

use crate::types::ProfileId;

/// An access profile declared in configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileSeed {
    /// Profile identifier.
    pub id: ProfileId,
    /// Profile name.
    #[serde(default)]
    pub name: String,
    /// Data quota in megabytes; absent means unlimited.
    #[serde(default)]
    pub quota_data_mb: Option<i64>,
    /// Time quota in minutes; absent means unlimited.
    #[serde(default)]
    pub quota_time_minutes: Option<i64>,
    /// Upload bandwidth in kbps.
    #[serde(default)]
    pub bandwidth_up_kbps: Option<i32>,
    /// Download bandwidth in kbps.
    #[serde(default)]
    pub bandwidth_down_kbps: Option<i32>,
}
