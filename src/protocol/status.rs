//! Response status codes.

use std::fmt;

use super::ProtocolError;

/// Outcome carried in the first byte of every response frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Status {
    #[default]
    None = 0,
    Ok = 1,
    Error = 2,
    KeyNotFound = 3,
}

impl Status {
    pub fn from_byte(byte: u8) -> Result<Self, ProtocolError> {
        match byte {
            0 => Ok(Status::None),
            1 => Ok(Status::Ok),
            2 => Ok(Status::Error),
            3 => Ok(Status::KeyNotFound),
            other => Err(ProtocolError::UnknownStatus(other)),
        }
    }

    pub fn as_byte(self) -> u8 {
        self as u8
    }

    pub fn is_ok(self) -> bool {
        self == Status::Ok
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Status::None => "NONE",
            Status::Ok => "OK",
            Status::Error => "ERR",
            Status::KeyNotFound => "KEYNOTFOUND",
        };
        f.write_str(name)
    }
}
