//! Cron scheduler for periodic maintenance tasks.

use std::sync::Arc;
use std::time::Duration;

use tokio_cron_scheduler::{Job as CronJob, JobScheduler};
use tracing;

use accessgate_core::config::AppConfig;
use accessgate_core::error::AppError;
use accessgate_service::{ControlDispatchQueue, SessionService};

/// Cron-based scheduler for periodic background tasks
pub struct CronScheduler {
    scheduler: JobScheduler,
    dispatch: Arc<ControlDispatchQueue>,
    sessions: Arc<SessionService>,
}

impl std::fmt::Debug for CronScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CronScheduler").finish()
    }
}

impl CronScheduler {
    /// Create a new cron scheduler
    pub async fn new(
        dispatch: Arc<ControlDispatchQueue>,
        sessions: Arc<SessionService>,
    ) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {}", e)))?;

        Ok(Self {
            scheduler,
            dispatch,
            sessions,
        })
    }

    /// Register the tasks enabled in configuration
    pub async fn register_default_tasks(&self, config: &AppConfig) -> Result<(), AppError> {
        self.register_stale_sent_sweep(
            &config.dispatch.sweep_schedule,
            Duration::from_secs(config.dispatch.stale_sent_after_seconds),
        )
        .await?;

        if config.session.reaper_enabled {
            self.register_session_reaper(
                &config.session.reaper_schedule,
                Duration::from_secs(config.session.stale_after_minutes * 60),
            )
            .await?;
        }

        tracing::info!("All scheduled tasks registered");
        Ok(())
    }

    /// Start the scheduler
    pub async fn start(&self) -> Result<(), AppError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {}", e)))?;

        tracing::info!("Cron scheduler started");
        Ok(())
    }

    /// Shutdown the scheduler
    pub async fn shutdown(&mut self) -> Result<(), AppError> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {}", e)))?;

        tracing::info!("Cron scheduler shut down");
        Ok(())
    }

    /// Resolve requests stuck in `sent` (crash between claim and resolve)
    async fn register_stale_sent_sweep(
        &self,
        schedule: &str,
        older_than: Duration,
    ) -> Result<(), AppError> {
        let dispatch = Arc::clone(&self.dispatch);
        let job = CronJob::new_async(schedule, move |_uuid, _lock| {
            let dispatch = Arc::clone(&dispatch);
            Box::pin(async move {
                tracing::trace!("Running stale sent sweep");
                match dispatch.sweep_stale(older_than).await {
                    Ok(swept) if !swept.is_empty() => {
                        tracing::warn!("Resolved {} stale sent control requests as nak", swept.len());
                    }
                    Ok(_) => {}
                    Err(e) => tracing::error!("Stale sent sweep failed: {}", e),
                }
            })
        })
        .map_err(|e| {
            AppError::internal(format!("Failed to create stale_sent_sweep schedule: {}", e))
        })?;

        self.scheduler.add(job).await.map_err(|e| {
            AppError::internal(format!("Failed to add stale_sent_sweep schedule: {}", e))
        })?;

        tracing::info!(
            "Registered: stale_sent_sweep ({}, older than {}s)",
            schedule,
            older_than.as_secs()
        );
        Ok(())
    }

    /// Expire sessions whose accounting stopped arriving
    async fn register_session_reaper(
        &self,
        schedule: &str,
        stale_after: Duration,
    ) -> Result<(), AppError> {
        let sessions = Arc::clone(&self.sessions);
        let job = CronJob::new_async(schedule, move |_uuid, _lock| {
            let sessions = Arc::clone(&sessions);
            Box::pin(async move {
                tracing::debug!("Running stale session reaper");
                if let Err(e) = sessions.reap_stale(stale_after).await {
                    tracing::error!("Stale session reaper failed: {}", e);
                }
            })
        })
        .map_err(|e| {
            AppError::internal(format!("Failed to create session_reaper schedule: {}", e))
        })?;

        self.scheduler.add(job).await.map_err(|e| {
            AppError::internal(format!("Failed to add session_reaper schedule: {}", e))
        })?;

        tracing::info!(
            "Registered: session_reaper ({}, stale after {}min)",
            schedule,
            stale_after.as_secs() / 60
        );
        Ok(())
    }
}
