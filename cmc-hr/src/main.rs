//! cmc-hr - HR administration service for Cathay Metal Corporation
//!
//! Startup order:
//! 1. Parse CLI, resolve configuration (CLI > env > TOML > defaults)
//! 2. Initialize tracing and log build identification
//! 3. Create root folder, open/create cmc.db
//! 4. Ensure a super admin exists
//! 5. Serve HTTP until Ctrl+C / SIGTERM

use std::fs::OpenOptions;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use cmc_common::config::RootFolderInitializer;
use cmc_hr::config::{Args, ServiceConfig};
use cmc_hr::db::users::ensure_bootstrap_admin;
use cmc_hr::{build_router, AppState};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing(config: &ServiceConfig) -> Result<()> {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = ServiceConfig::resolve(&args);

    init_tracing(&config)?;

    // Build identification comes first so startup problems can be matched to a build
    info!(
        "Starting cmc-hr v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    // Configuration was resolved before the subscriber existed
    config.config_source.log();

    let initializer = RootFolderInitializer::new(config.root_folder.clone());
    initializer
        .ensure_directory_exists()
        .context("Failed to initialize root folder")?;

    info!("Database: {}", config.database_path.display());
    let pool = cmc_hr::db::init_database(&config.database_path)
        .await
        .context("Failed to open database")?;

    if let Some(admin) =
        ensure_bootstrap_admin(&pool, config.bootstrap_admin_password.as_deref()).await?
    {
        let action = if admin.restored { "Restored" } else { "Created" };
        match admin.generated_password {
            Some(password) => warn!(
                "{} super admin '{}' with generated password: {} (change it after first login)",
                action, admin.username, password
            ),
            None => warn!(
                "{} super admin '{}' with the configured bootstrap password",
                action, admin.username
            ),
        }
    }

    let state = AppState::new(pool, config.session_ttl_minutes);
    let app = build_router(state);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!("cmc-hr listening on http://{}", address);
    info!("Health check: http://{}/health", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received terminate signal, shutting down"),
    }
}
