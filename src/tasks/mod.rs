//! Background Tasks Module
//!
//! Contains background tasks that run periodically during node operation.
//!
//! # Tasks
//! - Expiry sweep: physically removes entries whose TTL has elapsed

mod cleanup;

pub use cleanup::spawn_cleanup_task;
