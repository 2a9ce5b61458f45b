//! Per-user usage accumulator.

use accessgate_core::types::ProfileId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Usage totals for one (user, profile) pair.
///
/// Written by accounting as an upsert of the session's cumulative totals,
/// never incremented.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct UserAccess {
    /// Subscriber.
    pub user_id: String,
    /// Profile the usage counts against.
    pub profile_id: ProfileId,
    /// Data used in megabytes.
    pub quota_used_mb: i64,
    /// Time used in minutes.
    pub minutes_used: i64,
    /// Last write.
    pub updated_at: DateTime<Utc>,
}
