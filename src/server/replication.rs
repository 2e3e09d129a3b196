//! Replication fan-out.
//!
//! Writes accepted by a node are queued here and pushed to every joined
//! peer by a single worker task, in the order they were queued. Both the
//! queue and each peer's outbound buffer apply backpressure. A peer is only
//! skipped once its connection is gone or it stays stalled past the send
//! timeout. Nothing is acknowledged or retried.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::peers::{PeerSendError, PeerSet};
use crate::protocol::Command;

/// Handle used by connection handlers to enqueue replicated writes.
#[derive(Clone)]
pub struct Replicator {
    jobs: mpsc::Sender<Command>,
    shutdown: Arc<Notify>,
    worker: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl Replicator {
    /// Starts the fan-out worker with a queue of `capacity` pending writes.
    ///
    /// `peer_timeout` bounds how long one stalled peer can hold up the rest.
    pub fn spawn(peers: Arc<PeerSet>, capacity: usize, peer_timeout: Duration) -> Self {
        let (jobs, rx) = mpsc::channel(capacity.max(1));
        let shutdown = Arc::new(Notify::new());
        let worker = tokio::spawn(run_worker(
            rx,
            peers,
            peer_timeout,
            Arc::clone(&shutdown),
        ));

        Self {
            jobs,
            shutdown,
            worker: Arc::new(Mutex::new(Some(worker))),
        }
    }

    /// Queues `command` for every peer, waiting while the queue is full.
    ///
    /// Returns false only when the worker has shut down.
    pub async fn replicate(&self, command: Command) -> bool {
        match self.jobs.send(command).await {
            Ok(()) => true,
            Err(_) => {
                debug!("replication worker stopped, dropping write");
                false
            }
        }
    }

    /// Stops accepting jobs and waits until the queued ones are sent.
    pub async fn shutdown(&self) {
        self.shutdown.notify_one();
        let worker = self.worker.lock().await.take();
        if let Some(worker) = worker {
            if let Err(err) = worker.await {
                warn!(error = %err, "replication worker failed");
            }
        }
    }
}

async fn run_worker(
    mut jobs: mpsc::Receiver<Command>,
    peers: Arc<PeerSet>,
    peer_timeout: Duration,
    shutdown: Arc<Notify>,
) {
    loop {
        tokio::select! {
            job = jobs.recv() => match job {
                Some(command) => {
                    fan_out(&peers, &command, peer_timeout).await;
                }
                None => break,
            },
            _ = shutdown.notified() => {
                jobs.close();
                let mut drained = 0usize;
                while let Some(command) = jobs.recv().await {
                    fan_out(&peers, &command, peer_timeout).await;
                    drained += 1;
                }
                info!(drained, "replication worker drained");
                break;
            }
        }
    }
}

/// Sends one write to every peer currently joined.
///
/// Returns the number of peers the frame was queued for.
pub(crate) async fn fan_out(peers: &PeerSet, command: &Command, peer_timeout: Duration) -> usize {
    let targets = peers.snapshot().await;
    if targets.is_empty() {
        return 0;
    }

    let frame: Arc<[u8]> = match command.encode() {
        Ok(frame) => frame.into(),
        Err(err) => {
            warn!(error = %err, "failed to encode replicated write");
            return 0;
        }
    };

    let mut delivered = 0;
    for peer in targets {
        match peer.send(Arc::clone(&frame), peer_timeout).await {
            Ok(()) => {
                debug!(peer = %peer.addr, id = peer.id, "forwarded write to peer");
                delivered += 1;
            }
            Err(PeerSendError::Lagging) => {
                warn!(
                    peer = %peer.addr,
                    id = peer.id,
                    timeout_ms = peer_timeout.as_millis() as u64,
                    "peer stalled, dropping replicated write"
                );
            }
            Err(PeerSendError::Gone) => {
                debug!(peer = %peer.addr, id = peer.id, "peer connection already closed");
            }
        }
    }
    delivered
}
