//! ggcache - A minimal distributed in-memory cache
//!
//! A byte-keyed TTL cache served over a fixed little-endian binary protocol,
//! with best-effort leader-to-follower replication of writes.

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod protocol;
pub mod server;
pub mod tasks;

pub use client::Client;
pub use config::Config;
pub use server::{AppState, Server};
pub use tasks::spawn_cleanup_task;
