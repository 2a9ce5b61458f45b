//! NAS device repository.

use async_trait::async_trait;
use sqlx::PgPool;

use accessgate_core::error::{AppError, ErrorKind};
use accessgate_core::result::AppResult;
use accessgate_core::types::NasDeviceId;
use accessgate_entity::nas::NasDevice;

use crate::store::NasDeviceStore;

/// Repository for `nas_devices`.
#[derive(Debug, Clone)]
pub struct NasDeviceRepository {
    pool: PgPool,
}

impl NasDeviceRepository {
    /// Create a new NAS device repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NasDeviceStore for NasDeviceRepository {
    async fn find_by_ip(&self, nas_ip_address: &str) -> AppResult<Option<NasDevice>> {
        sqlx::query_as::<_, NasDevice>("SELECT * FROM nas_devices WHERE nas_ip_address = $1")
            .bind(nas_ip_address)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find NAS device", e))
    }

    async fn upsert_device(
        &self,
        nas_ip_address: &str,
        name: &str,
        connection_method: &str,
        enabled: bool,
    ) -> AppResult<NasDevice> {
        sqlx::query_as::<_, NasDevice>(
            "INSERT INTO nas_devices (id, nas_ip_address, name, connection_method, enabled) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (nas_ip_address) DO UPDATE SET \
                name = EXCLUDED.name, \
                connection_method = EXCLUDED.connection_method, \
                enabled = EXCLUDED.enabled \
             RETURNING *",
        )
        .bind(NasDeviceId::new())
        .bind(nas_ip_address)
        .bind(name)
        .bind(connection_method)
        .bind(enabled)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to upsert NAS device", e))
    }
}
