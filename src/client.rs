//! Cache Client
//!
//! Request/response client for a cache node. One request is in flight at a
//! time, so each reply is matched to the request that was just written.

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpStream, ToSocketAddrs};

use crate::error::{CacheError, Result};
use crate::protocol::{read_get_response, read_set_response, write_frame, Command, Status};

/// Client over any byte stream, TCP by default.
#[derive(Debug)]
pub struct Client<S = TcpStream> {
    stream: S,
}

impl Client<TcpStream> {
    /// Opens a TCP connection to `addr`.
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        Ok(Self { stream })
    }
}

impl<S> Client<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps an already connected stream.
    pub fn from_stream(stream: S) -> Self {
        Self { stream }
    }

    /// Stores `value` under `key`. `ttl` is in milliseconds, 0 never expires.
    pub async fn set(&mut self, key: &[u8], value: &[u8], ttl: i32) -> Result<()> {
        let frame = Command::set(key, value, ttl).encode()?;
        write_frame(&mut self.stream, &frame).await?;

        let resp = read_set_response(&mut self.stream).await?;
        match resp.status {
            Status::Ok => Ok(()),
            status => Err(CacheError::UnexpectedStatus(status)),
        }
    }

    /// Fetches the value stored under `key`.
    pub async fn get(&mut self, key: &[u8]) -> Result<Vec<u8>> {
        let frame = Command::get(key).encode()?;
        write_frame(&mut self.stream, &frame).await?;

        let resp = read_get_response(&mut self.stream).await?;
        match resp.status {
            Status::Ok => Ok(resp.value),
            Status::KeyNotFound => Err(CacheError::NotFound(
                String::from_utf8_lossy(key).into_owned(),
            )),
            status => Err(CacheError::UnexpectedStatus(status)),
        }
    }

    /// Announces this connection as a peer. The node sends no reply.
    pub async fn join(&mut self) -> Result<()> {
        write_frame(&mut self.stream, &Command::Join.encode()?).await?;
        Ok(())
    }

    /// Gives back the underlying stream.
    pub fn into_inner(self) -> S {
        self.stream
    }

    /// Closes the write side; the node finishes pending replies and hangs up.
    pub async fn close(mut self) -> Result<()> {
        self.stream.shutdown().await?;
        Ok(())
    }
}
