//! Database migration commands.

use clap::{Args, Subcommand};

use accessgate_core::config::AppConfig;
use accessgate_core::error::AppError;
use accessgate_database::DatabasePool;

use crate::output;

/// Arguments for the migrate command
#[derive(Debug, Args)]
pub struct MigrateArgs {
    /// Migration subcommand
    #[command(subcommand)]
    pub command: MigrateCommand,
}

/// Migration subcommands
#[derive(Debug, Subcommand)]
pub enum MigrateCommand {
    /// Run all pending migrations
    Run,
}

/// Execute migration commands
pub async fn execute(args: &MigrateArgs, mut config: AppConfig) -> Result<(), AppError> {
    match &args.command {
        MigrateCommand::Run => {
            config.database.run_migrations = false;
            let pool = DatabasePool::connect(&config.database).await?;
            println!("Running database migrations...");
            accessgate_database::migration::run_migrations(pool.pool()).await?;
            pool.close().await;
            output::print_success("All migrations applied successfully.");
        }
    }
    Ok(())
}
