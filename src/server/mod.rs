//! Server Module
//!
//! Accepts TCP connections, runs a connection handler for each one and owns
//! the shared store, the peer set and the replication worker.
//!
//! A node started with a leader address dials that leader, sends `Join` and
//! then treats the link as an upstream connection that feeds it writes.

mod connection;
mod peers;
mod replication;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::cache::{shared, CacheStore, SharedCache};
use crate::client::Client;
use crate::config::Config;
use crate::error::Result;
use crate::tasks::spawn_cleanup_task;

pub use connection::{handle_connection, ConnectionRole, Outbound};
pub use peers::{ConnectionId, Peer, PeerSendError, PeerSet};
pub use replication::Replicator;

/// State shared by every connection handler.
#[derive(Clone)]
pub struct AppState {
    /// The node's single store
    pub cache: SharedCache,
    /// Connections that joined this node
    pub peers: Arc<PeerSet>,
    /// Fan-out queue for accepted writes
    pub replicator: Replicator,
    /// Whether Join commands are honored
    pub is_leader: bool,
    /// Capacity of each connection's outbound queue
    pub connection_buffer: usize,
}

impl AppState {
    /// Creates a new AppState around `cache` and starts the replication worker.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(cache: CacheStore, config: &Config) -> Self {
        let peers = Arc::new(PeerSet::new());
        let replicator = Replicator::spawn(
            Arc::clone(&peers),
            config.replication_queue,
            config.peer_send_timeout(),
        );
        Self {
            cache: shared(cache),
            peers,
            replicator,
            is_leader: config.is_leader(),
            connection_buffer: config.connection_buffer,
        }
    }

    /// Creates a new AppState with an empty store.
    pub fn from_config(config: &Config) -> Self {
        Self::new(CacheStore::new(), config)
    }
}

/// A bound cache node, ready to run.
pub struct Server {
    listener: TcpListener,
    state: AppState,
    config: Config,
}

impl Server {
    /// Binds the listening socket and prepares the node state.
    pub async fn bind(config: Config) -> Result<Self> {
        let listener = TcpListener::bind(&config.listen_addr).await?;
        let state = AppState::from_config(&config);
        Ok(Self {
            listener,
            state,
            config,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Serves connections until `shutdown` resolves, then stops the sweep
    /// and drains pending replication.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send,
    {
        let Server {
            listener,
            state,
            config,
        } = self;
        tokio::pin!(shutdown);

        info!(
            addr = %listener.local_addr()?,
            leader = config.is_leader(),
            "server starting"
        );

        let cleanup = spawn_cleanup_task(state.cache.clone(), config.cleanup_interval());
        let upstream = config
            .leader_addr
            .clone()
            .map(|leader| spawn_leader_link(leader, state.clone()));

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                accepted = listener.accept() => handle_accept_result(accepted, &state),
            }
        }

        info!("server shutting down");
        cleanup.abort();
        if let Some(upstream) = upstream {
            upstream.abort();
        }
        state.replicator.shutdown().await;

        Ok(())
    }

    /// Serves connections until the process is stopped.
    pub async fn run(self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }
}

fn handle_accept_result(result: std::io::Result<(TcpStream, SocketAddr)>, state: &AppState) {
    match result {
        Ok((stream, addr)) => {
            spawn_connection(stream, addr.to_string(), ConnectionRole::Inbound, state)
        }
        Err(err) => warn!(error = %err, "accept error"),
    }
}

fn spawn_connection(stream: TcpStream, peer: String, role: ConnectionRole, state: &AppState) {
    let state = state.clone();
    tokio::spawn(async move {
        debug!(peer = %peer, "connection made");
        if let Err(err) = handle_connection(stream, peer.clone(), role, state).await {
            debug!(peer = %peer, error = %err, "connection closed with error");
        }
    });
}

fn spawn_leader_link(leader: String, state: AppState) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(err) = join_leader(&leader, state).await {
            error!(leader = %leader, error = %err, "lost connection to leader");
        }
    })
}

/// Dials the leader, announces this node and then applies whatever the
/// leader forwards on that same connection.
async fn join_leader(leader: &str, state: AppState) -> Result<()> {
    let mut client = Client::connect(leader).await?;
    client.join().await?;
    info!(leader = %leader, "connected to leader");

    handle_connection(
        client.into_inner(),
        leader.to_string(),
        ConnectionRole::Upstream,
        state,
    )
    .await
}
