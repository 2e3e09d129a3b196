//! Frame Primitives
//!
//! Length-prefixed field helpers shared by the command and response codecs.

use std::io;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::MAX_FIELD_LEN;

/// Errors raised while encoding or decoding a frame.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The source ran dry in the middle of a frame
    #[error("frame truncated while reading {field}")]
    Truncated { field: &'static str },

    /// A length prefix was below zero
    #[error("negative length {len} for {field}")]
    NegativeLength { field: &'static str, len: i32 },

    /// A length prefix exceeded MAX_FIELD_LEN
    #[error("length {len} for {field} exceeds the {max} byte limit")]
    LengthTooLarge {
        field: &'static str,
        len: usize,
        max: usize,
    },

    /// A field is longer than MAX_FIELD_LEN and would be refused by the reader
    #[error("{field} of {len} bytes cannot be encoded")]
    FieldTooLarge { field: &'static str, len: usize },

    /// Command tag outside the known set
    #[error("unknown command tag {0}")]
    UnknownCommand(u8),

    /// Command tag that is reserved but has no defined body
    #[error("command tag {0} is not implemented")]
    Unimplemented(u8),

    /// Status byte outside the known set
    #[error("unknown status byte {0}")]
    UnknownStatus(u8),

    /// Underlying transport failure
    #[error("transport error: {0}")]
    Io(#[from] io::Error),
}

impl ProtocolError {
    /// Maps an io error, turning an early EOF into a truncation of `field`.
    pub(crate) fn from_io(err: io::Error, field: &'static str) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            ProtocolError::Truncated { field }
        } else {
            ProtocolError::Io(err)
        }
    }
}

// == Writing ==

/// Appends a length-prefixed byte field.
///
/// Fields longer than `MAX_FIELD_LEN` are refused here, so anything that
/// encodes also decodes.
pub(crate) fn put_bytes(
    buf: &mut Vec<u8>,
    field: &'static str,
    bytes: &[u8],
) -> Result<(), ProtocolError> {
    let too_large = || ProtocolError::FieldTooLarge {
        field,
        len: bytes.len(),
    };
    if bytes.len() > MAX_FIELD_LEN {
        return Err(too_large());
    }
    let len = i32::try_from(bytes.len()).map_err(|_| too_large())?;
    buf.extend_from_slice(&len.to_le_bytes());
    buf.extend_from_slice(bytes);
    Ok(())
}

/// Writes one complete frame and flushes it.
pub async fn write_frame<W>(writer: &mut W, frame: &[u8]) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(frame).await?;
    writer.flush().await
}

// == Reading ==

pub(crate) async fn read_u8<R>(reader: &mut R, field: &'static str) -> Result<u8, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    reader
        .read_u8()
        .await
        .map_err(|err| ProtocolError::from_io(err, field))
}

pub(crate) async fn read_i32<R>(reader: &mut R, field: &'static str) -> Result<i32, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    reader
        .read_i32_le()
        .await
        .map_err(|err| ProtocolError::from_io(err, field))
}

/// Reads a length-prefixed byte field.
///
/// The buffer grows with the bytes actually received, so a bogus length
/// prefix cannot force a large allocation on its own.
pub(crate) async fn read_bytes<R>(
    reader: &mut R,
    field: &'static str,
) -> Result<Vec<u8>, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    let raw_len = read_i32(reader, field).await?;
    if raw_len < 0 {
        return Err(ProtocolError::NegativeLength {
            field,
            len: raw_len,
        });
    }

    let len = raw_len as usize;
    if len > MAX_FIELD_LEN {
        return Err(ProtocolError::LengthTooLarge {
            field,
            len,
            max: MAX_FIELD_LEN,
        });
    }

    let mut buf = Vec::with_capacity(len.min(8 * 1024));
    let read = (&mut *reader)
        .take(len as u64)
        .read_to_end(&mut buf)
        .await
        .map_err(|err| ProtocolError::from_io(err, field))?;

    if read < len {
        return Err(ProtocolError::Truncated { field });
    }

    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_bytes_prefixes_length() {
        let mut buf = Vec::new();
        put_bytes(&mut buf, "key", b"Foo").unwrap();
        assert_eq!(buf, vec![3, 0, 0, 0, b'F', b'o', b'o']);
    }

    #[test]
    fn test_put_bytes_empty_field() {
        let mut buf = Vec::new();
        put_bytes(&mut buf, "value", b"").unwrap();
        assert_eq!(buf, vec![0, 0, 0, 0]);
    }

    #[tokio::test]
    async fn test_field_at_limit_encodes_and_decodes() {
        let field = vec![7u8; MAX_FIELD_LEN];
        let mut buf = Vec::new();
        put_bytes(&mut buf, "value", &field).unwrap();

        let decoded = read_bytes(&mut &buf[..], "value").await.unwrap();
        assert_eq!(decoded.len(), MAX_FIELD_LEN);
    }

    #[tokio::test]
    async fn test_field_over_limit_rejected_on_both_sides() {
        let field = vec![7u8; MAX_FIELD_LEN + 1];
        let mut buf = Vec::new();
        let err = put_bytes(&mut buf, "value", &field).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::FieldTooLarge { field: "value", len } if len == MAX_FIELD_LEN + 1
        ));
        assert!(buf.is_empty());

        let raw = ((MAX_FIELD_LEN + 1) as i32).to_le_bytes();
        let err = read_bytes(&mut &raw[..], "value").await.unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::LengthTooLarge { field: "value", len, .. } if len == MAX_FIELD_LEN + 1
        ));
    }

    #[tokio::test]
    async fn test_read_bytes_negative_length() {
        let raw = (-5i32).to_le_bytes();
        let err = read_bytes(&mut &raw[..], "key").await.unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::NegativeLength { field: "key", len: -5 }
        ));
    }

    #[tokio::test]
    async fn test_read_bytes_length_over_limit() {
        let raw = i32::MAX.to_le_bytes();
        let err = read_bytes(&mut &raw[..], "value").await.unwrap_err();
        assert!(matches!(err, ProtocolError::LengthTooLarge { field: "value", .. }));
    }

    #[tokio::test]
    async fn test_read_bytes_short_body() {
        let mut raw = 10i32.to_le_bytes().to_vec();
        raw.extend_from_slice(b"abc");
        let err = read_bytes(&mut &raw[..], "key").await.unwrap_err();
        assert!(matches!(err, ProtocolError::Truncated { field: "key" }));
    }

    #[tokio::test]
    async fn test_read_i32_short_prefix() {
        let raw = [1u8, 0];
        let err = read_i32(&mut &raw[..], "ttl").await.unwrap_err();
        assert!(matches!(err, ProtocolError::Truncated { field: "ttl" }));
    }

    #[tokio::test]
    async fn test_write_frame_writes_everything() {
        let mut out = Vec::new();
        write_frame(&mut out, &[1, 2, 3]).await.unwrap();
        assert_eq!(out, vec![1, 2, 3]);
    }
}
