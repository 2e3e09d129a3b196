//! Peer bookkeeping for a leader.
//!
//! The set only holds weak handles to each joined connection's outbound
//! queue. Connections own their own lifecycle and remove themselves on close.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::RwLock;
use tokio::time::timeout;

use super::connection::Outbound;

/// Identifies one accepted or dialed connection for the lifetime of the process.
pub type ConnectionId = u64;

/// Why a frame could not be queued for a peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerSendError {
    /// The peer's connection has already terminated
    Gone,
    /// The peer's outbound queue stayed full for the whole wait
    Lagging,
}

/// A joined peer, as seen by the replication worker.
#[derive(Debug, Clone)]
pub struct Peer {
    pub id: ConnectionId,
    pub addr: String,
    outbound: mpsc::WeakSender<Outbound>,
}

impl Peer {
    /// Queues a pre-encoded frame on the peer's connection, waiting up to
    /// `wait` for room in its outbound queue.
    pub async fn send(&self, frame: Arc<[u8]>, wait: Duration) -> Result<(), PeerSendError> {
        let sender = self.outbound.upgrade().ok_or(PeerSendError::Gone)?;
        match timeout(wait, sender.send(Outbound::Frame(frame))).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => Err(PeerSendError::Gone),
            Err(_) => Err(PeerSendError::Lagging),
        }
    }
}

/// Set of connections that sent `Join`.
#[derive(Debug, Default)]
pub struct PeerSet {
    peers: RwLock<HashMap<ConnectionId, Peer>>,
    next_id: AtomicU64,
}

impl PeerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hands out a fresh connection id.
    pub fn next_id(&self) -> ConnectionId {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Registers a connection. Returns false if it had already joined.
    pub async fn join(
        &self,
        id: ConnectionId,
        addr: impl Into<String>,
        outbound: &mpsc::Sender<Outbound>,
    ) -> bool {
        let peer = Peer {
            id,
            addr: addr.into(),
            outbound: outbound.downgrade(),
        };
        self.peers.write().await.insert(id, peer).is_none()
    }

    /// Deregisters a connection. Returns true if it was a member.
    pub async fn leave(&self, id: ConnectionId) -> bool {
        self.peers.write().await.remove(&id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.peers.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.peers.read().await.is_empty()
    }

    /// Copies the current membership so fan-out never holds the lock while sending.
    pub async fn snapshot(&self) -> Vec<Peer> {
        self.peers.read().await.values().cloned().collect()
    }
}
