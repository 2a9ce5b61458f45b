//! Access profile repository.

use async_trait::async_trait;
use sqlx::PgPool;

use accessgate_core::error::{AppError, ErrorKind};
use accessgate_core::result::AppResult;
use accessgate_core::types::ProfileId;
use accessgate_entity::profile::AccessProfile;

use crate::store::ProfileStore;

/// Read-only repository for `access_profiles`.
#[derive(Debug, Clone)]
pub struct ProfileRepository {
    pool: PgPool,
}

impl ProfileRepository {
    /// Create a new profile repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileStore for ProfileRepository {
    async fn find_profile(&self, id: ProfileId) -> AppResult<Option<AccessProfile>> {
        sqlx::query_as::<_, AccessProfile>("SELECT * FROM access_profiles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find profile", e))
    }
}
