//! Connection Handler
//!
//! Decodes commands from one connection, dispatches each in its own task and
//! writes the replies back. Replies leave in request order: the connection's
//! writer task awaits the dispatched tasks in the order their commands arrived,
//! while the reader keeps decoding. All frames for a connection, replicated
//! writes included, go through that single writer so none is ever torn.

use std::io;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::peers::ConnectionId;
use super::AppState;
use crate::cache::ttl_from_millis;
use crate::error::{CacheError, Result};
use crate::protocol::{
    read_command, write_frame, Command, GetResponse, Response, SetResponse, Status,
};

/// How a node treats the far end of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionRole {
    /// A client or a peer that dialed us. Every Set and Get gets a reply.
    Inbound,
    /// Our own link to the leader. Replicated writes are applied silently,
    /// in arrival order.
    Upstream,
}

/// Work queued for a connection's writer task.
#[derive(Debug)]
pub enum Outbound {
    /// Reply produced by a dispatched command, None if it has no reply
    Reply(JoinHandle<Option<Response>>),
    /// Pre-encoded frame pushed by replication
    Frame(Arc<[u8]>),
}

/// Runs one connection until the remote side closes it or sends garbage.
///
/// Returns `Ok(())` on a clean close at a frame boundary. On return the
/// connection is no longer a member of the peer set.
pub async fn handle_connection<S>(
    stream: S,
    peer: String,
    role: ConnectionRole,
    state: AppState,
) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let id = state.peers.next_id();
    let (reader, writer) = tokio::io::split(stream);
    let mut reader = BufReader::new(reader);
    let (outbound, queue) = mpsc::channel(state.connection_buffer.max(1));

    debug!(peer = %peer, id, ?role, "connection opened");

    let writer_task = tokio::spawn(write_loop(writer, queue));
    let result = read_loop(&mut reader, &outbound, id, &peer, role, &state).await;

    if state.peers.leave(id).await {
        info!(peer = %peer, id, "peer left");
    }

    // Let the writer flush replies that are still in flight
    drop(outbound);
    let written = match writer_task.await {
        Ok(written) => written,
        Err(err) => Err(CacheError::Transport(io::Error::other(err))),
    };

    debug!(peer = %peer, id, "connection closed");
    result.and(written)
}

async fn read_loop<R>(
    reader: &mut R,
    outbound: &mpsc::Sender<Outbound>,
    id: ConnectionId,
    peer: &str,
    role: ConnectionRole,
    state: &AppState,
) -> Result<()>
where
    R: AsyncRead + Unpin,
{
    loop {
        let command = match read_command(reader).await {
            Ok(Some(command)) => command,
            Ok(None) => return Ok(()),
            Err(err) => {
                warn!(peer, error = %err, "failed to decode command, closing connection");
                return Err(err.into());
            }
        };

        debug!(peer, command = command.name(), "received command");

        if command == Command::Join {
            handle_join(state, id, peer, outbound).await;
            continue;
        }

        // Replicated writes are applied one at a time to keep the leader's order
        if role == ConnectionRole::Upstream {
            dispatch(command, state.clone()).await;
            continue;
        }

        let dispatched = tokio::spawn(dispatch(command, state.clone()));
        if outbound.send(Outbound::Reply(dispatched)).await.is_err() {
            return Err(CacheError::Transport(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "connection writer stopped",
            )));
        }
    }
}

async fn write_loop<W>(mut writer: W, mut queue: mpsc::Receiver<Outbound>) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(item) = queue.recv().await {
        match item {
            Outbound::Reply(dispatched) => {
                let response = match dispatched.await {
                    Ok(Some(response)) => response,
                    Ok(None) => continue,
                    Err(err) => {
                        warn!(error = %err, "command task failed, reply dropped");
                        continue;
                    }
                };
                write_frame(&mut writer, &response.encode()?).await?;
            }
            Outbound::Frame(frame) => write_frame(&mut writer, &frame).await?,
        }
    }

    // The far end may already be gone, nothing left to report
    let _ = writer.shutdown().await;
    Ok(())
}

async fn handle_join(
    state: &AppState,
    id: ConnectionId,
    peer: &str,
    outbound: &mpsc::Sender<Outbound>,
) {
    if !state.is_leader {
        warn!(peer, "ignoring join, this node is not the leader");
        return;
    }

    if state.peers.join(id, peer, outbound).await {
        info!(peer, id, "member joined the cluster");
    }
}

/// Runs one command against the store.
pub(crate) async fn dispatch(command: Command, state: AppState) -> Option<Response> {
    match command {
        Command::Set { key, value, ttl } => Some(handle_set(&state, key, value, ttl).await.into()),
        Command::Get { key } => Some(handle_get(&state, &key).await.into()),
        Command::Join => None,
    }
}

async fn handle_set(state: &AppState, key: Vec<u8>, value: Vec<u8>, ttl: i32) -> SetResponse {
    // The job is queued under the write guard so peers see writes in store order
    let mut cache = state.cache.write().await;
    let stored = cache.set(key.clone(), value.clone(), ttl_from_millis(ttl));

    match stored {
        Ok(()) => {
            state.replicator.replicate(Command::Set { key, value, ttl }).await;
            SetResponse::new(Status::Ok)
        }
        Err(err) => {
            warn!(error = %err, "set failed");
            SetResponse::new(Status::Error)
        }
    }
}

async fn handle_get(state: &AppState, key: &[u8]) -> GetResponse {
    match state.cache.read().await.get(key) {
        Ok(value) => GetResponse::found(value),
        Err(CacheError::NotFound(_)) => GetResponse::not_found(),
        Err(err) => {
            warn!(error = %err, "get failed");
            GetResponse::error()
        }
    }
}
