//! AccessGate Server: RADIUS accounting, quota enforcement and control dispatch.
//!
//! Main entry point that wires all crates together and starts the server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing;
use tracing_subscriber::{EnvFilter, fmt};

use accessgate_api::AppState;
use accessgate_cache::memory::MemoryWindowStore;
use accessgate_cache::redis::{RedisClient, RedisWindowStore};
use accessgate_cache::{RateLimitRule, RateLimiter, SlidingWindowStore};
use accessgate_core::config::AppConfig;
use accessgate_core::config::database::StoreBackend;
use accessgate_core::config::rate_limit::RateLimitBackend;
use accessgate_core::error::AppError;
use accessgate_database::{DatabasePool, MemoryStore, Stores};
use accessgate_entity::profile::AccessProfile;
use accessgate_nas::NasAdapterRegistry;
use accessgate_service::Services;
use accessgate_worker::{CronScheduler, DispatchRunner};

#[tokio::main]
async fn main() {
    let env = std::env::var("ACCESSGATE_ENV").unwrap_or_else(|_| "development".to_string());
    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);
    tracing::info!("Configuration loaded (env: {})", env);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting AccessGate v{}", env!("CARGO_PKG_VERSION"));
    let config = Arc::new(config);

    // ── Step 1: Stores ───────────────────────────────────────────
    let (stores, db_pool) = match config.database.backend {
        StoreBackend::Postgres => {
            tracing::info!("Connecting to database...");
            let pool = DatabasePool::connect(&config.database).await?;
            (Stores::postgres(&pool), Some(pool))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; state is lost on restart");
            let memory = Arc::new(MemoryStore::new());
            for seed in &config.profiles {
                memory.insert_profile(AccessProfile::from(seed.clone())).await;
            }
            tracing::info!("Seeded {} access profiles", config.profiles.len());
            (Stores::memory(memory), None)
        }
    };

    // ── Step 2: NAS devices + adapter registry ───────────────────
    for device in &config.nas.devices {
        stores
            .nas_devices
            .upsert_device(
                &device.nas_ip_address,
                &device.name,
                &device.connection_method,
                device.enabled,
            )
            .await?;
    }
    let registry = Arc::new(NasAdapterRegistry::from_config(
        &config.nas,
        stores.nas_devices.clone(),
    )?);

    // ── Step 3: Services ─────────────────────────────────────────
    let services = Services::new(&stores, registry, &config);

    // ── Step 4: Rate limiters ────────────────────────────────────
    let (accounting_limiter, control_limiter) = if config.rate_limit.enabled {
        let store = build_window_store(&config).await?;
        let accounting = RateLimiter::new(
            Arc::clone(&store),
            RateLimitRule::from(config.rate_limit.accounting),
            "accounting",
        );
        let control = RateLimiter::new(
            store,
            RateLimitRule::from(config.rate_limit.control),
            "control",
        );
        tracing::info!(
            "Rate limits: accounting {}/{}ms, control {}/{}ms",
            accounting.rule().max_requests,
            accounting.rule().window_ms,
            control.rule().max_requests,
            control.rule().window_ms
        );
        (Some(accounting), Some(control))
    } else {
        tracing::warn!("Rate limiting disabled");
        (None, None)
    };

    // ── Step 5: Shutdown channel ─────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Step 6: Background dispatch + scheduled maintenance ──────
    let runner_handle = if config.dispatch.enabled {
        let runner = DispatchRunner::new(Arc::clone(&services.dispatch), &config.dispatch);
        let cancel = shutdown_rx.clone();
        Some(tokio::spawn(async move { runner.run(cancel).await }))
    } else {
        tracing::info!("Background dispatch disabled");
        None
    };

    let mut scheduler =
        CronScheduler::new(Arc::clone(&services.dispatch), Arc::clone(&services.sessions))
            .await?;
    scheduler.register_default_tasks(&config).await?;
    scheduler.start().await?;

    // ── Step 7: Build and start HTTP server ──────────────────────
    let state = AppState::new(
        Arc::clone(&config),
        services,
        accounting_limiter,
        control_limiter,
    );
    let app = accessgate_api::build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!("AccessGate listening on {}", addr);

    // ── Step 8: Graceful shutdown ────────────────────────────────
    let server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, starting graceful shutdown...");
        let _ = shutdown_tx.send(true);
    });

    server
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    // ── Step 9: Wait for background tasks ────────────────────────
    tracing::info!("Waiting for background tasks to complete...");
    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    if let Some(handle) = runner_handle {
        let _ = tokio::time::timeout(grace, handle).await;
    }
    if let Err(e) = scheduler.shutdown().await {
        tracing::warn!("Scheduler shutdown failed: {}", e);
    }
    if let Some(pool) = db_pool {
        pool.close().await;
    }

    tracing::info!("AccessGate shut down gracefully");
    Ok(())
}

/// Counter store for the rate limiters
async fn build_window_store(config: &AppConfig) -> Result<Arc<dyn SlidingWindowStore>, AppError> {
    match config.rate_limit.backend {
        RateLimitBackend::Redis => {
            tracing::info!("Rate limit counters in Redis");
            let client = RedisClient::connect(&config.redis).await?;
            Ok(Arc::new(RedisWindowStore::new(client)))
        }
        RateLimitBackend::Memory => {
            let store = MemoryWindowStore::new();
            let window_ms = config
                .rate_limit
                .accounting
                .window_ms
                .max(config.rate_limit.control.window_ms);

            // Drop idle sources so the map does not grow without bound.
            let sweeper = store.clone();
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(Duration::from_millis(window_ms.max(1_000)));
                loop {
                    interval.tick().await;
                    sweeper.evict_idle(chrono::Utc::now().timestamp_millis(), window_ms);
                }
            });
            Ok(Arc::new(store))
        }
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
