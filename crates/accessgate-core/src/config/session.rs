//! Session maintenance configuration.

use serde::{Deserialize, Serialize};

/// Settings for the stale-session reaper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Whether the reaper job is scheduled.
    #[serde(default = "default_true")]
    pub reaper_enabled: bool,
    /// Non-terminal sessions silent for longer than this are expired.
    #[serde(default = "default_stale_after")]
    pub stale_after_minutes: u64,
    /// Cron expression for the reaper.
    #[serde(default = "default_reaper_schedule")]
    pub reaper_schedule: String,
    /// TTL in seconds for cached access profiles.
    #[serde(default = "default_profile_cache_ttl")]
    pub profile_cache_ttl_seconds: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            reaper_enabled: true,
            stale_after_minutes: default_stale_after(),
            reaper_schedule: default_reaper_schedule(),
            profile_cache_ttl_seconds: default_profile_cache_ttl(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_stale_after() -> u64 {
    24 * 60
}

fn default_reaper_schedule() -> String {
    "0 */5 * * * *".to_string()
}

fn default_profile_cache_ttl() -> u64 {
    60
}
