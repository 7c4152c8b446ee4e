//! Per-connection control loop.
//!
//! Each accepted connection runs one handler as its own task. The handler
//! reads the nickname, registers the participant, classifies every later
//! line, and tears the session down on quit, end-of-stream, or a read
//! error. No fault here ever propagates to another connection.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::dispatch::{broadcast_line, BroadcastJob, DispatchPool};
use crate::protocol::{join_notice, leave_notice, Command};
use crate::server::connection::Connection;
use crate::server::registry::{Participant, Registry};

pub struct ConnectionHandler {
    conn: Connection,
    registry: Arc<Registry>,
    pool: Arc<DispatchPool>,
}

impl ConnectionHandler {
    pub fn new(conn: Connection, registry: Arc<Registry>, pool: Arc<DispatchPool>) -> Self {
        Self {
            conn,
            registry,
            pool,
        }
    }

    /// Drive the connection from registration to teardown
    pub async fn run(mut self) {
        let participant = match self.await_nickname().await {
            Some(participant) => participant,
            None => {
                // Never registered: close silently, no broadcast
                let _ = self.conn.writer().shutdown().await;
                return;
            }
        };

        info!(
            "{} joined the chat. Total participants: {}",
            participant.nickname(),
            self.registry.len()
        );

        self.chat_loop(&participant).await;
        self.teardown(participant).await;
    }

    /// Read exactly one line as the nickname and register the participant.
    ///
    /// Returns `None` when the line is missing, empty, or whitespace-only;
    /// the connection is then dropped without registration.
    async fn await_nickname(&mut self) -> Option<Arc<Participant>> {
        let line = match self.conn.read_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                warn!("Failed to receive participant nickname from {}", self.conn.peer());
                return None;
            }
            Err(e) => {
                warn!("Error reading nickname from {}: {}", self.conn.peer(), e);
                return None;
            }
        };

        let nickname = line.trim();
        if nickname.is_empty() {
            warn!("Empty nickname from {}, dropping connection", self.conn.peer());
            return None;
        }

        // The participant becomes visible only here, fully constructed
        let participant = Arc::new(Participant::new(nickname.to_string(), self.conn.writer()));
        self.registry.add(participant.clone());

        let notice = join_notice(nickname, self.registry.lexicon());
        broadcast_line(&self.registry, &notice).await;

        debug!("Participant {} connected from {}", nickname, self.conn.peer());
        Some(participant)
    }

    /// Read lines until quit, end-of-stream, or a read error
    async fn chat_loop(&mut self, participant: &Arc<Participant>) {
        loop {
            let line = match self.conn.read_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    warn!("Communication error with {}: {}", participant.nickname(), e);
                    break;
                }
            };

            match Command::classify(&line, self.registry.lexicon()) {
                None => continue,
                Some(Command::ListUsers) => {
                    let list = self.registry.format_user_list();
                    if let Err(e) = participant.writer().send_line(&list).await {
                        warn!(
                            "Failed to send user list to {}: {}",
                            participant.nickname(),
                            e
                        );
                    }
                }
                Some(Command::Quit) => {
                    info!("{} requested to leave the chat.", participant.nickname());
                    break;
                }
                Some(Command::Chat(text)) => {
                    debug!("Message received from {}: {}", participant.nickname(), text);
                    let job =
                        BroadcastJob::new(participant.nickname().to_string(), text.to_string());
                    if let Err(e) = self.pool.submit(job).await {
                        warn!("Dropping message from {}: {}", participant.nickname(), e);
                    }
                }
            }
        }
    }

    /// Close the transport, deregister, and notify the remaining members.
    ///
    /// Removal is idempotent; the leave notice goes out only if this call
    /// actually removed the participant.
    async fn teardown(&self, participant: Arc<Participant>) {
        let _ = participant.writer().shutdown().await;
        debug!("Connection closed for {}", participant.nickname());

        if self.registry.remove(&participant.id()) {
            let notice = leave_notice(participant.nickname(), self.registry.lexicon());
            broadcast_line(&self.registry, &notice).await;
            info!(
                "{} left the chat. Total participants: {}",
                participant.nickname(),
                self.registry.len()
            );
        }
    }
}
