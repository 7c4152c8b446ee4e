//! Parley Chat Server - Entry Point
//!
//! Starts the accept loop and the broadcast dispatch pool with graceful
//! shutdown support.

use std::path::Path;
use std::sync::Arc;

use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use parley::config::{Config, LogConfig};
use parley::dispatch::DispatchPool;
use parley::error::Result;
use parley::server::{ChatServer, Registry};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing (console + append-only file sink)
    init_tracing(&config.log)?;

    info!("Starting Parley Chat Server");
    info!("Configuration loaded (language: {})", config.server.language.as_str());

    // Shared registry and dispatch pool
    let lexicon = config.server.language.lexicon();
    let registry = Arc::new(Registry::new(lexicon));
    let pool = Arc::new(DispatchPool::spawn(&config.dispatch, registry.clone()));

    // Create chat server
    let server = ChatServer::new(config.server.clone(), registry.clone(), pool);

    // Create shutdown channel
    let (shutdown_tx, _) = watch::channel(false);
    let server_shutdown = shutdown_tx.subscribe();

    let server_task = tokio::spawn(async move {
        if let Err(e) = server.run(server_shutdown).await {
            error!("Chat server error: {}", e);
        }
    });

    info!("Server started on {}", config.server_addr());

    // Wait for shutdown signal
    shutdown_signal().await;
    info!("Shutdown signal received");

    let _ = shutdown_tx.send(true);
    let _ = tokio::join!(server_task);

    info!("Parley Chat Server stopped");
    Ok(())
}

/// Set up the console and file log layers
fn init_tracing(log: &LogConfig) -> Result<()> {
    std::fs::create_dir_all(&log.dir)?;
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(Path::new(&log.dir).join("server.log"))?;
    let file = Arc::new(file);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("parley={}", log.level).into());

    let registry = tracing_subscriber::registry().with(env_filter);

    if log.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_writer(file),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer())
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(file),
            )
            .init();
    }

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
