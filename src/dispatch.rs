//! Broadcast dispatch pool
//!
//! A fixed-size set of workers consumes broadcast jobs from a bounded queue,
//! decoupling fan-out cost from the connection read loops: one slow consumer
//! cannot stall another sender. When the queue is full, submission blocks
//! the submitting handler (accepted degradation rather than unbounded
//! memory growth).

use std::sync::Arc;

use chrono::Local;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, warn};

use crate::config::DispatchConfig;
use crate::error::{ChatError, Result};
use crate::protocol::chat_line;
use crate::server::registry::{Participant, Registry};

/// One chat message to fan out: immutable, consumed exactly once by one
/// worker. The timestamp is taken at formatting time, not submission time.
#[derive(Debug, Clone)]
pub struct BroadcastJob {
    sender: String,
    text: String,
}

impl BroadcastJob {
    pub fn new(sender: String, text: String) -> Self {
        Self { sender, text }
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Fixed-size worker pool executing broadcast jobs
pub struct DispatchPool {
    tx: mpsc::Sender<BroadcastJob>,
}

impl DispatchPool {
    /// Start the workers. They run until every handle to the pool has been
    /// dropped and the queue has drained.
    pub fn spawn(config: &DispatchConfig, registry: Arc<Registry>) -> Self {
        let (tx, rx) = mpsc::channel(config.queue_capacity);
        let rx = Arc::new(Mutex::new(rx));

        for worker_id in 0..config.workers {
            let rx = rx.clone();
            let registry = registry.clone();
            tokio::spawn(async move {
                worker_loop(worker_id, rx, registry).await;
            });
        }

        debug!(
            "Dispatch pool started with {} workers (queue capacity {})",
            config.workers, config.queue_capacity
        );

        Self { tx }
    }

    /// Queue a job for asynchronous delivery.
    ///
    /// Blocks when the queue is at capacity.
    pub async fn submit(&self, job: BroadcastJob) -> Result<()> {
        self.tx.send(job).await.map_err(|_| ChatError::DispatchClosed)
    }
}

async fn worker_loop(
    worker_id: usize,
    rx: Arc<Mutex<mpsc::Receiver<BroadcastJob>>>,
    registry: Arc<Registry>,
) {
    loop {
        // The lock only guards queue removal; delivery runs unlocked so
        // workers fan out in parallel.
        let job = { rx.lock().await.recv().await };
        match job {
            Some(job) => deliver(&registry, &job).await,
            None => break,
        }
    }
    debug!("Dispatch worker {} stopped", worker_id);
}

/// Execute one broadcast job against the current membership
async fn deliver(registry: &Registry, job: &BroadcastJob) {
    let snapshot = registry.snapshot();
    if snapshot.is_empty() {
        // Benign: everyone left between submission and delivery
        warn!("No participants available to receive the message");
        return;
    }

    let line = chat_line(job.sender(), job.text(), Local::now());
    debug!(
        "Delivering message from {} to {} participants",
        job.sender(),
        snapshot.len()
    );
    broadcast_to(&snapshot, &line).await;
}

/// Write one formatted line to every current registry member.
///
/// Used for join/leave notices as well as by the dispatch workers.
pub async fn broadcast_line(registry: &Registry, line: &str) {
    broadcast_to(&registry.snapshot(), line).await;
}

async fn broadcast_to(participants: &[Arc<Participant>], line: &str) {
    for participant in participants {
        // A failed recipient must not abort delivery to the rest
        if let Err(e) = participant.writer().send_line(line).await {
            warn!(
                "Failed to deliver to {}: {} (skipping)",
                participant.nickname(),
                e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Lexicon, CHAT_PREFIX};
    use tokio_test::assert_ok;
    use crate::server::connection::ConnectionWriter;
    use std::time::Duration;
    use tokio::io::{AsyncBufReadExt, BufReader, DuplexStream};
    use tokio::time::timeout;

    fn participant(nickname: &str) -> (Arc<Participant>, BufReader<DuplexStream>) {
        let (writer, peer) = tokio::io::duplex(1024);
        let participant = Arc::new(Participant::new(
            nickname.to_string(),
            ConnectionWriter::new(writer),
        ));
        (participant, BufReader::new(peer))
    }

    async fn next_line(reader: &mut BufReader<DuplexStream>) -> String {
        let mut line = String::new();
        timeout(Duration::from_secs(2), reader.read_line(&mut line))
            .await
            .expect("timed out waiting for a line")
            .expect("read failed");
        line.trim_end().to_string()
    }

    #[tokio::test]
    async fn test_deliver_reaches_every_member_including_sender() {
        let registry = Registry::new(Lexicon::ENGLISH);
        let (alice, mut alice_rx) = participant("alice");
        let (bob, mut bob_rx) = participant("bob");
        registry.add(alice);
        registry.add(bob);

        let job = BroadcastJob::new("alice".to_string(), "hello".to_string());
        deliver(&registry, &job).await;

        for rx in [&mut alice_rx, &mut bob_rx] {
            let line = next_line(rx).await;
            assert!(line.starts_with(CHAT_PREFIX));
            assert!(line.ends_with("(alice) - hello"));
        }
    }

    #[tokio::test]
    async fn test_deliver_with_empty_registry_is_a_no_op() {
        let registry = Registry::new(Lexicon::ENGLISH);
        let job = BroadcastJob::new("alice".to_string(), "hello".to_string());
        // Must not panic or error
        deliver(&registry, &job).await;
    }

    #[tokio::test]
    async fn test_failed_recipient_does_not_abort_fanout() {
        let registry = Registry::new(Lexicon::ENGLISH);

        let (dead_writer, dead_peer) = tokio::io::duplex(16);
        drop(dead_peer);
        registry.add(Arc::new(Participant::new(
            "dead".to_string(),
            ConnectionWriter::new(dead_writer),
        )));

        let (bob, mut bob_rx) = participant("bob");
        registry.add(bob);

        broadcast_line(&registry, "[CHAT] still here").await;
        assert_eq!(next_line(&mut bob_rx).await, "[CHAT] still here");
    }

    #[tokio::test]
    async fn test_pool_executes_submitted_jobs() {
        let registry = Arc::new(Registry::new(Lexicon::ENGLISH));
        let (alice, mut alice_rx) = participant("alice");
        registry.add(alice);

        let config = DispatchConfig {
            workers: 2,
            queue_capacity: 8,
        };
        let pool = DispatchPool::spawn(&config, registry.clone());

        tokio_test::assert_ok!(
            pool.submit(BroadcastJob::new("alice".to_string(), "hi".to_string())).await
        );

        let line = next_line(&mut alice_rx).await;
        assert!(line.ends_with("(alice) - hi"));
    }

    #[tokio::test]
    async fn test_per_worker_submissions_stay_fifo() {
        let registry = Arc::new(Registry::new(Lexicon::ENGLISH));
        let (alice, mut alice_rx) = participant("alice");
        registry.add(alice);

        // Single worker: submission order is delivery order
        let config = DispatchConfig {
            workers: 1,
            queue_capacity: 8,
        };
        let pool = DispatchPool::spawn(&config, registry.clone());

        for i in 0..3 {
            pool.submit(BroadcastJob::new("alice".to_string(), format!("msg-{}", i)))
                .await
                .unwrap();
        }

        for i in 0..3 {
            let line = next_line(&mut alice_rx).await;
            assert!(line.ends_with(&format!("(alice) - msg-{}", i)), "got {}", line);
        }
    }
}
