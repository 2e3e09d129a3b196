//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::{Duration, Instant};

// == Cache Entry ==
/// Represents a single cache entry with value and expiry metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The stored value
    pub value: Vec<u8>,
    /// Absolute expiry instant, None = no expiration
    pub expires_at: Option<Instant>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry, measuring the TTL from now.
    ///
    /// # Arguments
    /// * `value` - The value to store
    /// * `ttl` - Optional time to live
    pub fn new(value: Vec<u8>, ttl: Option<Duration>) -> Self {
        Self::new_at(value, ttl, Instant::now())
    }

    /// Creates a new cache entry whose TTL is measured from `now`.
    pub fn new_at(value: Vec<u8>, ttl: Option<Duration>, now: Instant) -> Self {
        Self {
            value,
            expires_at: ttl.map(|ttl| now + ttl),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once `now` reaches its expiry instant, so a read
    /// made after the full TTL has elapsed never sees the value.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    pub fn is_expired_at(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(expires) => now >= expires,
            None => false,
        }
    }

    // == Time To Live ==
    /// Returns the remaining TTL, or None if no expiration is set.
    ///
    /// # Returns
    /// - `Some(Duration::ZERO)` if the entry has expired
    /// - `Some(remaining)` if the entry has TTL and hasn't expired
    /// - `None` if the entry never expires
    pub fn ttl_remaining(&self) -> Option<Duration> {
        self.expires_at
            .map(|expires| expires.saturating_duration_since(Instant::now()))
    }
}
