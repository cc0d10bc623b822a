use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stashcast_core::{
    load_config, load_config_from_env, validate_config, CatalogSource, Config, EasynewsClient,
    FileSearch, ReconciliationPipeline, RefreshScheduler, ResultStore, StashDbClient,
};
use stashcast_server::{api::create_router, state::AppState};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

/// Config file from `STASHCAST_CONFIG`, else `config.toml` when present,
/// else environment variables only.
fn load() -> Result<Config> {
    if let Ok(path) = std::env::var("STASHCAST_CONFIG") {
        let path = PathBuf::from(path);
        info!("Loading configuration from {:?}", path);
        return load_config(&path)
            .with_context(|| format!("Failed to load config from {:?}", path));
    }

    let default_path = PathBuf::from("config.toml");
    if default_path.exists() {
        info!("Loading configuration from {:?}", default_path);
        return load_config(&default_path)
            .with_context(|| format!("Failed to load config from {:?}", default_path));
    }

    info!("No config file, using environment variables");
    load_config_from_env().context("Failed to load config from environment")
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = load()?;

    // Missing secrets are fatal
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!(
        target_count = config.refresh.target_count,
        interval_secs = config.refresh.interval_secs,
        "Refresh settings"
    );

    let catalog: Arc<dyn CatalogSource> = Arc::new(
        StashDbClient::new(&config.metadata).context("Failed to create StashDB client")?,
    );
    info!("StashDB client initialized ({})", config.metadata.url);

    let search: Arc<dyn FileSearch> = Arc::new(
        EasynewsClient::new(&config.file_search).context("Failed to create Easynews client")?,
    );
    info!("Easynews client initialized ({})", config.file_search.url);

    let store = Arc::new(ResultStore::new());

    let pipeline = Arc::new(ReconciliationPipeline::new(
        catalog,
        search,
        config.file_search.operator_credentials(),
        Arc::clone(&store),
        &config.refresh,
    ));

    let scheduler = Arc::new(RefreshScheduler::new(
        pipeline,
        Duration::from_secs(config.refresh.interval_secs),
    ));
    scheduler.start();

    // Create app state
    let state = Arc::new(AppState::new(
        config.clone(),
        Arc::clone(&store),
        Arc::clone(&scheduler),
    ));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Install in Stremio: http://localhost:{}/manifest.json", config.server.port);

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");
    scheduler.stop();
    info!("Scheduler stopped");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
