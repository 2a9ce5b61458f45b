//! Embedded migration runner.

use sqlx::PgPool;
use tracing::info;

use accessgate_core::error::{AppError, ErrorKind};

/// Run all pending migrations from `/migrations`.
pub async fn run_migrations(pool: &PgPool) -> Result<(), AppError> {
    info!("Running database migrations...");

    let migrator = sqlx::migrate!("../../migrations");
    migrator.run(pool).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Database,
            format!("Failed to run migrations: {e}"),
            e,
        )
    })?;

    info!(
        migrations = migrator.iter().count(),
        "Database migrations completed successfully"
    );
    Ok(())
}
