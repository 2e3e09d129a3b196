//! Configuration Module
//!
//! Handles loading and managing node configuration from environment variables.

use std::env;
use std::time::Duration;

/// Node configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
/// A node without a leader address acts as the leader.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the node listens on
    pub listen_addr: String,
    /// Address of the leader to join, None when this node is the leader
    pub leader_addr: Option<String>,
    /// Interval in milliseconds between expiry sweeps
    pub cleanup_interval_ms: u64,
    /// Capacity of the replication fan-out queue
    pub replication_queue: usize,
    /// Capacity of each connection's outbound frame queue
    pub connection_buffer: usize,
    /// How long fan-out waits on a full peer queue before skipping that peer
    pub peer_send_timeout_ms: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `LISTEN_ADDR` - Listen address (default: 127.0.0.1:3000)
    /// - `LEADER_ADDR` - Leader to join (default: unset, node is the leader)
    /// - `CLEANUP_INTERVAL_MS` - Expiry sweep frequency in ms (default: 1000)
    /// - `REPLICATION_QUEUE` - Pending fan-out jobs (default: 1024)
    /// - `CONNECTION_BUFFER` - Pending frames per connection (default: 256)
    /// - `PEER_SEND_TIMEOUT_MS` - Wait on a stalled peer in ms (default: 5000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            listen_addr: env::var("LISTEN_ADDR").unwrap_or(defaults.listen_addr),
            leader_addr: env::var("LEADER_ADDR").ok().filter(|v| !v.is_empty()),
            cleanup_interval_ms: parse_var("CLEANUP_INTERVAL_MS")
                .unwrap_or(defaults.cleanup_interval_ms),
            replication_queue: parse_var("REPLICATION_QUEUE")
                .unwrap_or(defaults.replication_queue),
            connection_buffer: parse_var("CONNECTION_BUFFER")
                .unwrap_or(defaults.connection_buffer),
            peer_send_timeout_ms: parse_var("PEER_SEND_TIMEOUT_MS")
                .unwrap_or(defaults.peer_send_timeout_ms),
        }
    }

    /// Returns true when the node accepts joins and fans writes out.
    pub fn is_leader(&self) -> bool {
        self.leader_addr.is_none()
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_millis(self.cleanup_interval_ms.max(1))
    }

    pub fn peer_send_timeout(&self) -> Duration {
        Duration::from_millis(self.peer_send_timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:3000".to_string(),
            leader_addr: None,
            cleanup_interval_ms: 1000,
            replication_queue: 1024,
            connection_buffer: 256,
            peer_send_timeout_ms: 5000,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}
