//! CLI command definitions and dispatch.

pub mod control;
pub mod migrate;
pub mod session;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use accessgate_core::config::AppConfig;
use accessgate_core::error::AppError;
use accessgate_database::{DatabasePool, Stores};
use accessgate_nas::NasAdapterRegistry;
use accessgate_service::Services;

use crate::output::OutputFormat;

/// AccessGate: RADIUS accounting, quota enforcement and control dispatch
#[derive(Debug, Parser)]
#[command(name = "accessgate", version, about, long_about = None)]
pub struct Cli {
    /// Configuration environment overlay (`config/{env}.toml`)
    #[arg(short, long, default_value = "development", env = "ACCESSGATE_ENV")]
    pub env: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Database migration management
    Migrate(migrate::MigrateArgs),
    /// Session inspection
    Session(session::SessionArgs),
    /// Control queue management
    Control(control::ControlArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        let config = AppConfig::load(&self.env)?;
        match &self.command {
            Commands::Migrate(args) => migrate::execute(args, config).await,
            Commands::Session(args) => session::execute(args, &config, self.format).await,
            Commands::Control(args) => control::execute(args, &config, self.format).await,
        }
    }
}

/// Connect to PostgreSQL and build the service graph.
///
/// The CLI always works against the database; the in-memory backend only
/// lives inside a server process.
pub async fn connect_services(config: &AppConfig) -> Result<(DatabasePool, Services), AppError> {
    let mut db_config = config.database.clone();
    db_config.run_migrations = false;
    let pool = DatabasePool::connect(&db_config).await?;
    let stores = Stores::postgres(&pool);
    let registry = NasAdapterRegistry::from_config(&config.nas, stores.nas_devices.clone())?;
    let services = Services::new(&stores, Arc::new(registry), config);
    Ok((pool, services))
}
