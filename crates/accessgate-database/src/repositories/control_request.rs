//! Control request repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;
use tracing::debug;

use accessgate_core::error::{AppError, ErrorKind};
use accessgate_core::result::AppResult;
use accessgate_core::types::ControlRequestId;
use accessgate_entity::control::{
    ControlQueueStats, ControlRequest, ControlStatus, EnqueueOutcome, NewControlRequest,
};

use crate::store::ControlRequestStore;

/// Attempts at insert-or-fetch before giving up on a racing resolver.
const ENQUEUE_ATTEMPTS: usize = 3;

/// Repository for `control_requests`.
///
/// The outstanding guard is the partial unique index
/// `uq_control_requests_outstanding`; claims use `FOR UPDATE SKIP LOCKED`.
#[derive(Debug, Clone)]
pub struct ControlRequestRepository {
    pool: PgPool,
}

impl ControlRequestRepository {
    /// Create a new control request repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn try_insert(&self, new: &NewControlRequest) -> AppResult<Option<ControlRequest>> {
        sqlx::query_as::<_, ControlRequest>(
            "INSERT INTO control_requests \
                (id, session_id, request_type, attributes, nas_ip_address, nas_port_id, \
                 status, requeued_from) \
             VALUES ($1, $2, $3, $4, $5, $6, 'pending', $7) \
             ON CONFLICT (session_id, request_type) WHERE status IN ('pending', 'sent') \
             DO NOTHING RETURNING *",
        )
        .bind(ControlRequestId::new())
        .bind(&new.session_id)
        .bind(new.request_type)
        .bind(Json(&new.attributes))
        .bind(&new.nas_ip_address)
        .bind(&new.nas_port_id)
        .bind(new.requeued_from)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to enqueue control request", e))
    }

    async fn find_outstanding(&self, new: &NewControlRequest) -> AppResult<Option<ControlRequest>> {
        sqlx::query_as::<_, ControlRequest>(
            "SELECT * FROM control_requests \
             WHERE session_id = $1 AND request_type = $2 AND status IN ('pending', 'sent') \
             LIMIT 1",
        )
        .bind(&new.session_id)
        .bind(new.request_type)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find outstanding request", e)
        })
    }
}

#[async_trait]
impl ControlRequestStore for ControlRequestRepository {
    async fn enqueue_guarded(&self, new: NewControlRequest) -> AppResult<EnqueueOutcome> {
        for attempt in 1..=ENQUEUE_ATTEMPTS {
            if let Some(created) = self.try_insert(&new).await? {
                return Ok(EnqueueOutcome::Created(created));
            }
            // The conflicting row may be resolved before we read it back.
            if let Some(existing) = self.find_outstanding(&new).await? {
                return Ok(EnqueueOutcome::Existing(existing));
            }
            debug!(
                session_id = %new.session_id,
                attempt,
                "Outstanding request resolved during enqueue, retrying"
            );
        }
        Err(AppError::conflict(format!(
            "Could not enqueue {} for session '{}'",
            new.request_type, new.session_id
        )))
    }

    async fn claim_pending(&self, limit: u32) -> AppResult<Vec<ControlRequest>> {
        let mut claimed = sqlx::query_as::<_, ControlRequest>(
            "UPDATE control_requests SET status = 'sent', sent_at = NOW() \
             WHERE id IN ( \
                SELECT id FROM control_requests \
                WHERE status = 'pending' \
                ORDER BY created_at ASC, id ASC \
                FOR UPDATE SKIP LOCKED \
                LIMIT $1 \
             ) RETURNING *",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to claim control requests", e))?;

        // RETURNING does not preserve the subquery order.
        claimed.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.as_uuid().cmp(b.id.as_uuid()))
        });
        Ok(claimed)
    }

    async fn resolve(
        &self,
        id: ControlRequestId,
        status: ControlStatus,
        response_code: Option<i32>,
        error_message: Option<&str>,
    ) -> AppResult<Option<ControlRequest>> {
        if !status.is_terminal() {
            return Err(AppError::internal(format!(
                "Cannot resolve control request to '{status}'"
            )));
        }
        sqlx::query_as::<_, ControlRequest>(
            "UPDATE control_requests SET status = $2, response_code = $3, error_message = $4, \
                response_at = NOW() \
             WHERE id = $1 AND status = 'sent' RETURNING *",
        )
        .bind(id)
        .bind(status)
        .bind(response_code)
        .bind(error_message)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to resolve control request", e))
    }

    async fn sweep_stale_sent(
        &self,
        before: DateTime<Utc>,
        error_message: &str,
    ) -> AppResult<Vec<ControlRequest>> {
        sqlx::query_as::<_, ControlRequest>(
            "UPDATE control_requests SET status = 'nak', error_message = $2, response_at = NOW() \
             WHERE status = 'sent' AND sent_at < $1 RETURNING *",
        )
        .bind(before)
        .bind(error_message)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to sweep stale requests", e))
    }

    async fn find_by_id(&self, id: ControlRequestId) -> AppResult<Option<ControlRequest>> {
        sqlx::query_as::<_, ControlRequest>("SELECT * FROM control_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find control request", e))
    }

    async fn list(
        &self,
        status: Option<ControlStatus>,
        limit: u32,
    ) -> AppResult<Vec<ControlRequest>> {
        sqlx::query_as::<_, ControlRequest>(
            "SELECT * FROM control_requests \
             WHERE ($1::control_status IS NULL OR status = $1) \
             ORDER BY created_at DESC LIMIT $2",
        )
        .bind(status)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list control requests", e))
    }

    async fn stats(&self) -> AppResult<ControlQueueStats> {
        let rows: Vec<(ControlStatus, i64)> = sqlx::query_as(
            "SELECT status, COUNT(*) FROM control_requests GROUP BY status",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count control requests", e))?;

        let mut stats = ControlQueueStats::default();
        for (status, count) in rows {
            stats.record(status, count);
        }
        Ok(stats)
    }
}
