//! Tally Binary Entry Point
//!
//! Serves the Tally HTTP API.
//! Core functionality is provided by the `tally` library crate.

use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tally::{
    config::{AppConfig, DatabaseDriver},
    server::{AppState, create_router},
};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Tally - Typed Event-Metric Warehouse
#[derive(Parser, Debug)]
#[command(name = "tally", version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        default_value = "configs/config.yaml",
        env = "TALLY_CONFIG"
    )]
    config: String,

    /// Server bind address (overrides config file)
    #[arg(long, env = "TALLY_SERVER_BIND")]
    server_bind: Option<String>,

    /// Server port (overrides config file)
    #[arg(long, env = "TALLY_SERVER_PORT")]
    server_port: Option<u16>,

    /// Storage driver: sqlite or memory (overrides config file)
    #[arg(long, env = "TALLY_DB_DRIVER")]
    db_driver: Option<DatabaseDriver>,

    /// Database path or URL (overrides config file)
    #[arg(long, env = "TALLY_DB_DSN")]
    db_dsn: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tally=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Tally - Typed Event-Metric Warehouse");

    let cli = Cli::parse();

    tracing::info!("Loading configuration from: {}", cli.config);
    let mut config = AppConfig::load(&cli.config)?;

    // CLI > ENV > config file
    if let Some(bind) = cli.server_bind {
        config.server.bind = bind;
    }
    if let Some(port) = cli.server_port {
        config.server.port = port;
    }
    if let Some(driver) = cli.db_driver {
        config.database.driver = driver;
    }
    if let Some(dsn) = cli.db_dsn {
        config.database.dsn = dsn;
    }
    config.validate()?;

    tracing::info!(
        "Server: {}:{}, Database: {} ({})",
        config.server.bind,
        config.server.port,
        config.database.dsn,
        config.database.driver,
    );

    let handles = config.database.storage_builder().build().await?;
    tracing::info!("Storage initialized");

    let app = create_router(AppState {
        warehouse: handles.warehouse.clone(),
    });

    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Web server listening on: http://{}", addr);
    tracing::info!("Press Ctrl+C to shutdown");

    let stopping = Arc::new(Notify::new());
    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal(stopping.clone()));
    let server = tokio::spawn(async move { server.await });

    match drain(server, &stopping, config.server.shutdown_timeout).await {
        Ok(()) => tracing::info!("Server stopped"),
        Err(e) => tracing::error!("Server error: {}", e),
    }

    tracing::info!("Shutting down storage...");
    handles.shutdown().await;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Wait for the server task, giving in-flight requests `timeout` once the
/// shutdown signal has fired.
async fn drain(
    mut server: JoinHandle<std::io::Result<()>>,
    stopping: &Notify,
    timeout: Duration,
) -> Result<(), Box<dyn std::error::Error>> {
    tokio::select! {
        result = &mut server => return Ok(result??),
        _ = stopping.notified() => {}
    }

    match tokio::time::timeout(timeout, &mut server).await {
        Ok(result) => Ok(result??),
        Err(_) => {
            tracing::warn!("Graceful shutdown timed out after {:?}", timeout);
            server.abort();
            Ok(())
        }
    }
}

/// Setup graceful shutdown signal handler.
async fn shutdown_signal(stopping: Arc<Notify>) {
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
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal");
        }
    }

    stopping.notify_one();
}
