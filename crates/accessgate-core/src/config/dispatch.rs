//! Control dispatch queue configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::nas::NasConfig;
use crate::error::AppError;

/// Background drain settings for the control dispatch queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Whether the background drain runner is started.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Maximum number of requests claimed per drain.
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,
    /// Adapter calls in flight at once during a drain.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Interval in seconds between background drains.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
    /// Requests left `sent` longer than this are resolved `nak`.
    #[serde(default = "default_stale_sent_after")]
    pub stale_sent_after_seconds: u64,
    /// Cron expression for the stale-`sent` sweep.
    #[serde(default = "default_sweep_schedule")]
    pub sweep_schedule: String,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            batch_size: default_batch_size(),
            concurrency: default_concurrency(),
            poll_interval_seconds: default_poll_interval(),
            stale_sent_after_seconds: default_stale_sent_after(),
            sweep_schedule: default_sweep_schedule(),
        }
    }
}

impl DispatchConfig {
    /// Longest a single drain can keep requests `sent`: every wave of
    /// `concurrency` adapter calls may run up to the adapter timeout.
    pub fn worst_case_drain(&self, nas: &NasConfig) -> Duration {
        let concurrency = self.concurrency.max(1) as u64;
        let waves = u64::from(self.batch_size).div_ceil(concurrency);
        Duration::from_millis(waves.saturating_mul(nas.timeout_ms))
    }

    /// Reject settings under which the stale sweep could resolve requests
    /// that a drain is still waiting on.
    pub fn validate(&self, nas: &NasConfig) -> Result<(), AppError> {
        if self.batch_size == 0 {
            return Err(AppError::configuration("dispatch.batch_size must be positive"));
        }
        if self.concurrency == 0 {
            return Err(AppError::configuration("dispatch.concurrency must be positive"));
        }
        let drain = self.worst_case_drain(nas);
        if Duration::from_secs(self.stale_sent_after_seconds) <= drain {
            return Err(AppError::configuration(format!(
                "dispatch.stale_sent_after_seconds ({}s) must exceed the worst-case drain \
                 duration ({}ms for batch_size {} at concurrency {} with nas.timeout_ms {})",
                self.stale_sent_after_seconds,
                drain.as_millis(),
                self.batch_size,
                self.concurrency,
                nas.timeout_ms
            )));
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}

fn default_batch_size() -> u32 {
    50
}

fn default_concurrency() -> usize {
    8
}

fn default_poll_interval() -> u64 {
    5
}

fn default_stale_sent_after() -> u64 {
    300
}

fn default_sweep_schedule() -> String {
    "0 * * * * *".to_string()
}
