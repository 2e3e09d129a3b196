//! Cache Store Module
//!
//! Main cache engine: a HashMap of byte keys with lazily checked TTL expiry.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::cache::CacheEntry;
use crate::error::{CacheError, Result};

// == Cache Store ==
/// Byte-keyed cache storage with TTL support.
///
/// The store itself is not synchronized; share it as a
/// [`SharedCache`](crate::cache::SharedCache) so that writers take the
/// exclusive lock and readers the shared one.
#[derive(Debug, Default)]
pub struct CacheStore {
    /// Key-value storage
    entries: HashMap<Vec<u8>, CacheEntry>,
}

impl CacheStore {
    // == Constructor ==
    /// Creates an empty CacheStore.
    pub fn new() -> Self {
        Self::default()
    }

    // == Set ==
    /// Stores a key-value pair with optional TTL.
    ///
    /// If the key already exists, the value is overwritten and the TTL is
    /// measured again from this call. Expiry lives on the entry itself, so an
    /// earlier TTL can never remove the newer value.
    ///
    /// # Arguments
    /// * `key` - The key to store
    /// * `value` - The value to store
    /// * `ttl` - Optional time to live, None keeps the entry until deleted
    pub fn set(&mut self, key: Vec<u8>, value: Vec<u8>, ttl: Option<Duration>) -> Result<()> {
        let entry = CacheEntry::new(value, ttl);
        self.entries.insert(key, entry);
        Ok(())
    }

    // == Get ==
    /// Retrieves a copy of the value stored under `key`.
    ///
    /// Entries past their TTL are reported as not found even if the sweep
    /// has not removed them yet.
    pub fn get(&self, key: &[u8]) -> Result<Vec<u8>> {
        match self.live_entry(key, Instant::now()) {
            Some(entry) => Ok(entry.value.clone()),
            None => Err(CacheError::NotFound(
                String::from_utf8_lossy(key).into_owned(),
            )),
        }
    }

    // == Has ==
    /// Returns true if `key` holds a value that has not expired.
    pub fn has(&self, key: &[u8]) -> bool {
        self.live_entry(key, Instant::now()).is_some()
    }

    // == Delete ==
    /// Removes an entry by key. Deleting a missing key is not an error.
    pub fn delete(&mut self, key: &[u8]) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired_at(now));
        before - self.entries.len()
    }

    // == Length ==
    /// Returns the number of stored entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    /// Returns true if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn live_entry(&self, key: &[u8], now: Instant) -> Option<&CacheEntry> {
        self.entries
            .get(key)
            .filter(|entry| !entry.is_expired_at(now))
    }
}

/// Converts a wire TTL in milliseconds into a store TTL.
///
/// Zero and negative values mean the entry never expires.
pub fn ttl_from_millis(ttl_ms: i32) -> Option<Duration> {
    if ttl_ms > 0 {
        Some(Duration::from_millis(ttl_ms as u64))
    } else {
        None
    }
}
