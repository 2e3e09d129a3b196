//! Command frames sent from clients (and leaders) to a cache node.

use std::io;

use tokio::io::{AsyncRead, AsyncReadExt};

use super::frame::{put_bytes, read_bytes, read_i32, ProtocolError};

const TAG_SET: u8 = 1;
const TAG_GET: u8 = 2;
const TAG_DEL: u8 = 3;
const TAG_JOIN: u8 = 4;

/// A decoded request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Store `value` under `key`. `ttl` is in milliseconds, zero or less never expires.
    Set {
        key: Vec<u8>,
        value: Vec<u8>,
        ttl: i32,
    },
    Get {
        key: Vec<u8>,
    },
    /// Announces the sender as a peer that wants replicated writes.
    Join,
}

impl Command {
    pub fn set(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>, ttl: i32) -> Self {
        Command::Set {
            key: key.into(),
            value: value.into(),
            ttl,
        }
    }

    pub fn get(key: impl Into<Vec<u8>>) -> Self {
        Command::Get { key: key.into() }
    }

    pub fn tag(&self) -> u8 {
        match self {
            Command::Set { .. } => TAG_SET,
            Command::Get { .. } => TAG_GET,
            Command::Join => TAG_JOIN,
        }
    }

    /// Short name used in log lines.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Set { .. } => "SET",
            Command::Get { .. } => "GET",
            Command::Join => "JOIN",
        }
    }

    /// Encodes the command into a single frame.
    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        let mut buf = vec![self.tag()];
        match self {
            Command::Set { key, value, ttl } => {
                buf.reserve(12 + key.len() + value.len());
                put_bytes(&mut buf, "key", key)?;
                put_bytes(&mut buf, "value", value)?;
                buf.extend_from_slice(&ttl.to_le_bytes());
            }
            Command::Get { key } => {
                buf.reserve(4 + key.len());
                put_bytes(&mut buf, "key", key)?;
            }
            Command::Join => {}
        }
        Ok(buf)
    }
}

/// Reads the next command frame from `reader`.
///
/// Returns `Ok(None)` when the stream ends cleanly on a frame boundary.
/// Running out of bytes anywhere past the tag is a truncation error.
pub async fn read_command<R>(reader: &mut R) -> Result<Option<Command>, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    let tag = match reader.read_u8().await {
        Ok(tag) => tag,
        Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(err) => return Err(ProtocolError::Io(err)),
    };

    let command = match tag {
        TAG_SET => {
            let key = read_bytes(reader, "key").await?;
            let value = read_bytes(reader, "value").await?;
            let ttl = read_i32(reader, "ttl").await?;
            Command::Set { key, value, ttl }
        }
        TAG_GET => {
            let key = read_bytes(reader, "key").await?;
            Command::Get { key }
        }
        TAG_JOIN => Command::Join,
        TAG_DEL => return Err(ProtocolError::Unimplemented(tag)),
        other => return Err(ProtocolError::UnknownCommand(other)),
    };

    Ok(Some(command))
}
