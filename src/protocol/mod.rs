//! Wire Protocol Module
//!
//! Byte-exact encoding and decoding of cache commands and responses,
//! independent of the transport they travel on.
//!
//! # Frame Layout
//! All integers are little-endian, lengths are signed 32-bit.
//!
//! Commands start with a one byte tag:
//! - `Set`  (1): `keyLen:i32, key, valueLen:i32, value, ttl:i32`
//! - `Get`  (2): `keyLen:i32, key`
//! - `Del`  (3): reserved, rejected as unimplemented
//! - `Join` (4): no body
//!
//! Responses carry no tag, the reader must know which one to expect:
//! - Set response: `status:u8`
//! - Get response: `status:u8, valueLen:i32, value` (empty unless status is OK)

mod command;
mod frame;
mod response;
mod status;

#[cfg(test)]
mod property_tests;

pub use command::{read_command, Command};
pub use frame::{write_frame, ProtocolError};
pub use response::{read_get_response, read_set_response, GetResponse, Response, SetResponse};
pub use status::Status;

// == Public Constants ==
/// Largest key or value length accepted when decoding a frame (64 MiB)
pub const MAX_FIELD_LEN: usize = 64 * 1024 * 1024;
