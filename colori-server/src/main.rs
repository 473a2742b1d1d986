//! colori-server - ColoriAI seasonal color analysis service
//!
//! Accepts selfies, has them analyzed by a vision model, stores the parsed
//! reports and serves them back as JSON or PDF.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use colori_common::config::{CliOverrides, Config};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use colori_server::services::image_generator;
use colori_server::services::{
    ClerkClient, CloudinaryUploader, GeminiClient, ImageUploader, PassthroughUploader,
};
use colori_server::{build_router, AppState, ServerSettings};

/// Command-line arguments for colori-server
#[derive(Parser, Debug)]
#[command(name = "colori-server")]
#[command(about = "Seasonal color analysis service")]
#[command(version)]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// SQLite database file
    #[arg(short, long)]
    database: Option<PathBuf>,
}

fn init_tracing(config: &Config) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},tower_http=info", config.logging.level)));

    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer());

    match &config.logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .init();
        }
        None => registry.init(),
    }
    Ok(())
}

fn build_state(config: &Config, db: sqlx::SqlitePool) -> Result<AppState> {
    let timeout = Duration::from_secs(config.limits.request_timeout_secs);

    let analyzer = GeminiClient::new(
        config.gemini.base_url.clone(),
        config.gemini.model.clone(),
        config.gemini.api_key.clone().unwrap_or_default(),
        timeout,
    )
    .context("Failed to create Gemini client")?;

    let image_generator =
        image_generator::from_config(&config.image, timeout).context("Failed to create image generator")?;

    let uploader: Arc<dyn ImageUploader> = match &config.cdn {
        Some(cdn) => {
            info!(cloud = %cdn.cloud_name, folder = %cdn.folder, "Outfit images will be re-hosted");
            Arc::new(CloudinaryUploader::new(cdn, timeout).context("Failed to create CDN uploader")?)
        }
        None => Arc::new(PassthroughUploader),
    };

    let identity = ClerkClient::new(
        config.identity.base_url.clone(),
        config.identity.secret_key.clone().unwrap_or_default(),
        timeout,
    )
    .context("Failed to create identity client")?;

    let settings = ServerSettings {
        admin_role: config.identity.admin_role.clone(),
        max_selfie_bytes: config.limits.max_selfie_bytes,
        allowed_origins: config.server.allowed_origins.clone(),
    };

    Ok(AppState::new(
        db,
        Arc::new(analyzer),
        image_generator,
        uploader,
        Arc::new(identity),
        settings,
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let cli = CliOverrides {
        config_path: args.config,
        port: args.port,
        database_path: args.database,
    };

    let config = Config::load(&cli).context("Failed to load configuration")?;
    init_tracing(&config)?;

    info!(
        "Starting ColoriAI server (colori-server) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    if let Err(e) = config.validate() {
        error!("{}", e);
        return Err(e.into());
    }
    info!(
        image_provider = ?config.image.provider,
        cdn = config.cdn.is_some(),
        "Configuration loaded"
    );

    let db_path = config.resolved_database_path();
    info!("Database: {}", db_path.display());
    let db = colori_common::db::init_database(&db_path)
        .await
        .context("Failed to open database")?;

    let state = build_state(&config, db)?;
    let app = build_router(state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
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
            Ok(mut sig) => {
                sig.recv().await;
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
