//! Accounting counter updates.

use accessgate_core::error::AppError;
use accessgate_core::result::AppResult;
use serde::{Deserialize, Serialize};

/// Largest value a 32-bit RADIUS counter attribute can carry.
pub const RADIUS_COUNTER_MAX: i64 = u32::MAX as i64;

/// Counter values reported by one accounting event.
///
/// `None` means the NAS did not report that counter; it is left untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterUpdate {
    /// Cumulative session time in seconds.
    pub session_time: Option<i64>,
    /// Cumulative received bytes.
    pub rx_bytes: Option<i64>,
    /// Cumulative transmitted bytes.
    pub tx_bytes: Option<i64>,
    /// Cumulative received packets.
    pub rx_packets: Option<i64>,
    /// Cumulative transmitted packets.
    pub tx_packets: Option<i64>,
}

impl CounterUpdate {
    /// Check whether any counter was reported.
    pub fn is_empty(&self) -> bool {
        self.session_time.is_none()
            && self.rx_bytes.is_none()
            && self.tx_bytes.is_none()
            && self.rx_packets.is_none()
            && self.tx_packets.is_none()
    }
}

/// Combine an octet counter with its `*-Gigawords` overflow count.
///
/// Octets above 32 bits are accepted as a 64-bit counter only when no
/// gigawords have accumulated. Results that do not fit in `i64` are
/// rejected.
pub fn combine_octets(octets: Option<i64>, gigawords: Option<i64>) -> AppResult<Option<i64>> {
    let Some(gigawords) = gigawords else {
        return Ok(octets);
    };
    if !(0..=RADIUS_COUNTER_MAX).contains(&gigawords) {
        return Err(AppError::invalid_request(format!(
            "gigawords {gigawords} outside 0..={RADIUS_COUNTER_MAX}"
        )));
    }
    let octets = octets.unwrap_or(0);
    if octets < 0 {
        return Err(AppError::invalid_request("octets must not be negative"));
    }
    if octets > RADIUS_COUNTER_MAX {
        if gigawords == 0 {
            return Ok(Some(octets));
        }
        return Err(AppError::invalid_request(format!(
            "octets {octets} exceed 32 bits while gigawords is {gigawords}"
        )));
    }

    gigawords
        .checked_mul(1_i64 << 32)
        .and_then(|high| high.checked_add(octets))
        .map(Some)
        .ok_or_else(|| {
            AppError::invalid_request(format!("gigawords {gigawords} overflow the octet counter"))
        })
}
