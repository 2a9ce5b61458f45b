//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section. Every field carries a serde default, so an empty source set
//! still yields a runnable in-memory configuration.

pub mod app;
pub mod cache;
pub mod database;
pub mod dispatch;
pub mod logging;
pub mod nas;
pub mod profiles;
pub mod rate_limit;
pub mod session;

use serde::{Deserialize, Serialize};

use self::app::ServerConfig;
use self::cache::RedisConfig;
use self::database::DatabaseConfig;
use self::dispatch::DispatchConfig;
use self::logging::LoggingConfig;
use self::nas::NasConfig;
use self::profiles::ProfileSeed;
use self::rate_limit::RateLimitConfig;
use self::session::SessionConfig;

use crate::error::AppError;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Persistence backend settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Redis connection settings.
    #[serde(default)]
    pub redis: RedisConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Control dispatch queue settings.
    #[serde(default)]
    pub dispatch: DispatchConfig,
    /// NAS adapter settings.
    #[serde(default)]
    pub nas: NasConfig,
    /// Ingress rate limiting.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// Session maintenance settings.
    #[serde(default)]
    pub session: SessionConfig,
    /// Access profiles seeded into the in-memory backend.
    #[serde(default)]
    pub profiles: Vec<ProfileSeed>,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the default configuration with an environment-specific overlay
    /// and environment variables prefixed with `ACCESSGATE__`
    /// (e.g. `ACCESSGATE__DISPATCH__BATCH_SIZE=100`).
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("ACCESSGATE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let config: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-section constraints that serde defaults cannot express.
    pub fn validate(&self) -> Result<(), AppError> {
        self.dispatch.validate(&self.nas)
    }
}
