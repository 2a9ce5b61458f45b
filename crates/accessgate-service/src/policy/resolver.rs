//! Profile resolver with a short-lived in-process cache.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::debug;

use accessgate_core::error::AppError;
use accessgate_core::result::AppResult;
use accessgate_core::types::ProfileId;
use accessgate_database::store::ProfileStore;
use accessgate_entity::profile::AccessProfile;

const CACHE_CAPACITY: u64 = 10_000;

/// Looks up the access profile bound to a session.
///
/// Profiles are read-only to AccessGate and change rarely, so lookups are
/// cached for the configured TTL. Missing profiles are not cached.
#[derive(Clone)]
pub struct PolicyResolver {
    profiles: Arc<dyn ProfileStore>,
    cache: Cache<ProfileId, AccessProfile>,
}

impl PolicyResolver {
    /// Create a resolver caching entries for `ttl`.
    pub fn new(profiles: Arc<dyn ProfileStore>, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(ttl)
            .build();
        Self { profiles, cache }
    }

    /// Find a profile, or `None` if it does not exist.
    pub async fn find(&self, profile_id: ProfileId) -> AppResult<Option<AccessProfile>> {
        if let Some(profile) = self.cache.get(&profile_id).await {
            return Ok(Some(profile));
        }
        let profile = self.profiles.find_profile(profile_id).await?;
        if let Some(profile) = &profile {
            debug!(profile_id = %profile_id, "Caching access profile");
            self.cache.insert(profile_id, profile.clone()).await;
        }
        Ok(profile)
    }

    /// Find a profile that must exist.
    pub async fn resolve(&self, profile_id: ProfileId) -> AppResult<AccessProfile> {
        self.find(profile_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Access profile '{profile_id}' not found")))
    }

    /// Drop a cached profile.
    pub async fn invalidate(&self, profile_id: ProfileId) {
        self.cache.invalidate(&profile_id).await;
    }
}
