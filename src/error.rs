//! Error types for the cache node
//!
//! Provides unified error handling using thiserror.

use std::io;

use thiserror::Error;

use crate::protocol::{ProtocolError, Status};

// == Cache Error Enum ==
/// Unified error type for the cache node and client.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key not found in cache (or past its TTL)
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Store failure, reported to clients with the `Error` status
    #[error("Store error: {0}")]
    Store(String),

    /// Malformed, truncated or unknown frame
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Read or write failure on a connection
    #[error("Transport error: {0}")]
    Transport(#[from] io::Error),

    /// The remote node answered with a status other than OK
    #[error("Server responded with non OK status [{0}]")]
    UnexpectedStatus(Status),
}

// == Result Type Alias ==
/// Convenience Result type for the cache node.
pub type Result<T> = std::result::Result<T, CacheError>;
