//! Cache Module
//!
//! Provides an in-memory byte cache with TTL expiration.

mod entry;
mod store;


use std::sync::Arc;

use tokio::sync::RwLock;

// Re-export public types
pub use entry::CacheEntry;
pub use store::{ttl_from_millis, CacheStore};

/// The single store instance shared by every connection.
///
/// Mutations take the write lock, reads take the read lock, which makes
/// every store operation linearizable.
pub type SharedCache = Arc<RwLock<CacheStore>>;

/// Wraps a store for sharing across tasks.
pub fn shared(store: CacheStore) -> SharedCache {
    Arc::new(RwLock::new(store))
}
