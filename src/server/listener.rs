//! Accept loop
//!
//! Binds the listening endpoint once and spawns one connection handler per
//! accepted stream. Handlers are never awaited; their lifecycle is their
//! own.

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::config::ServerConfig;
use crate::dispatch::DispatchPool;
use crate::error::{ChatError, Result};
use crate::server::connection::Connection;
use crate::server::handler::ConnectionHandler;
use crate::server::registry::Registry;

/// Chat server
pub struct ChatServer {
    config: ServerConfig,
    registry: Arc<Registry>,
    pool: Arc<DispatchPool>,
}

impl ChatServer {
    pub fn new(config: ServerConfig, registry: Arc<Registry>, pool: Arc<DispatchPool>) -> Self {
        Self {
            config,
            registry,
            pool,
        }
    }

    /// Bind the configured endpoint and run until shutdown or a fatal
    /// accept error
    pub async fn run(&self, shutdown: watch::Receiver<bool>) -> Result<()> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ChatError::Bind { addr: addr.clone(), source })?;

        info!("Chat server listening on {}", addr);
        self.run_with_listener(listener, shutdown).await
    }

    /// Accept loop over an already-bound listener
    pub async fn run_with_listener(
        &self,
        listener: TcpListener,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<()> {
        loop {
            tokio::select! {
                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((stream, peer)) => {
                            debug!("Client connected: {}", peer);

                            let handler = ConnectionHandler::new(
                                Connection::new(stream, peer),
                                self.registry.clone(),
                                self.pool.clone(),
                            );
                            tokio::spawn(handler.run());
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                            return Err(e.into());
                        }
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("Chat server shutting down");
                        break;
                    }
                }
            }
        }

        Ok(())
    }
}
