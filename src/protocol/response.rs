//! Response frames written back to the requesting connection.

use tokio::io::AsyncRead;

use super::frame::{put_bytes, read_bytes, read_u8, ProtocolError};
use super::Status;

/// Reply to a `Set` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SetResponse {
    pub status: Status,
}

impl SetResponse {
    pub fn new(status: Status) -> Self {
        Self { status }
    }

    pub fn encode(&self) -> Vec<u8> {
        vec![self.status.as_byte()]
    }
}

/// Reply to a `Get` command.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GetResponse {
    pub status: Status,
    pub value: Vec<u8>,
}

impl GetResponse {
    pub fn found(value: impl Into<Vec<u8>>) -> Self {
        Self {
            status: Status::Ok,
            value: value.into(),
        }
    }

    pub fn not_found() -> Self {
        Self {
            status: Status::KeyNotFound,
            value: Vec::new(),
        }
    }

    pub fn error() -> Self {
        Self {
            status: Status::Error,
            value: Vec::new(),
        }
    }

    /// Encodes the response. Only an OK response carries value bytes.
    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        let value: &[u8] = if self.status.is_ok() { &self.value } else { &[] };
        let mut buf = Vec::with_capacity(5 + value.len());
        buf.push(self.status.as_byte());
        put_bytes(&mut buf, "value", value)?;
        Ok(buf)
    }
}

/// Any response a node may send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Set(SetResponse),
    Get(GetResponse),
}

impl Response {
    pub fn status(&self) -> Status {
        match self {
            Response::Set(resp) => resp.status,
            Response::Get(resp) => resp.status,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        match self {
            Response::Set(resp) => Ok(resp.encode()),
            Response::Get(resp) => resp.encode(),
        }
    }
}

impl From<SetResponse> for Response {
    fn from(resp: SetResponse) -> Self {
        Response::Set(resp)
    }
}

impl From<GetResponse> for Response {
    fn from(resp: GetResponse) -> Self {
        Response::Get(resp)
    }
}

/// Reads a `Set` response frame.
pub async fn read_set_response<R>(reader: &mut R) -> Result<SetResponse, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    let status = Status::from_byte(read_u8(reader, "status").await?)?;
    Ok(SetResponse { status })
}

/// Reads a `Get` response frame.
pub async fn read_get_response<R>(reader: &mut R) -> Result<GetResponse, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    let status = Status::from_byte(read_u8(reader, "status").await?)?;
    let value = read_bytes(reader, "value").await?;
    Ok(GetResponse { status, value })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_response_layout() {
        assert_eq!(SetResponse::new(Status::Ok).encode(), vec![1]);
        assert_eq!(SetResponse::new(Status::Error).encode(), vec![2]);
    }

    #[test]
    fn test_get_response_layout() {
        let bytes = GetResponse::found("Bar").encode().unwrap();
        assert_eq!(bytes, vec![1, 3, 0, 0, 0, b'B', b'a', b'r']);
    }

    #[test]
    fn test_get_response_not_found_layout() {
        let bytes = GetResponse::not_found().encode().unwrap();
        assert_eq!(bytes, vec![3, 0, 0, 0, 0]);
    }

    #[test]
    fn test_non_ok_response_drops_value_bytes() {
        let resp = GetResponse {
            status: Status::Error,
            value: b"leftover".to_vec(),
        };
        assert_eq!(resp.encode().unwrap(), vec![2, 0, 0, 0, 0]);
    }

    #[tokio::test]
    async fn test_parse_set_response() {
        let bytes = SetResponse::new(Status::Ok).encode();
        let parsed = read_set_response(&mut &bytes[..]).await.unwrap();
        assert_eq!(parsed.status, Status::Ok);
    }

    #[tokio::test]
    async fn test_parse_get_response() {
        let resp = GetResponse::found("Bar");
        let bytes = resp.encode().unwrap();
        let parsed = read_get_response(&mut &bytes[..]).await.unwrap();
        assert_eq!(parsed, resp);
    }

    #[tokio::test]
    async fn test_parse_missing_key_response() {
        let bytes = GetResponse::not_found().encode().unwrap();
        let parsed = read_get_response(&mut &bytes[..]).await.unwrap();
        assert_eq!(parsed.status, Status::KeyNotFound);
        assert!(parsed.value.is_empty());
    }

    #[tokio::test]
    async fn test_parse_truncated_get_response() {
        let bytes = [1u8, 5, 0, 0, 0, b'a'];
        let err = read_get_response(&mut &bytes[..]).await.unwrap_err();
        assert!(matches!(err, ProtocolError::Truncated { field: "value" }));
    }

    #[tokio::test]
    async fn test_parse_empty_set_response() {
        let bytes: [u8; 0] = [];
        let err = read_set_response(&mut &bytes[..]).await.unwrap_err();
        assert!(matches!(err, ProtocolError::Truncated { field: "status" }));
    }

    #[tokio::test]
    async fn test_parse_unknown_status() {
        let bytes = [7u8];
        let err = read_set_response(&mut &bytes[..]).await.unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownStatus(7)));
    }

    #[test]
    fn test_response_status() {
        let resp: Response = GetResponse::not_found().into();
        assert_eq!(resp.status(), Status::KeyNotFound);
        let resp: Response = SetResponse::new(Status::Ok).into();
        assert_eq!(resp.encode().unwrap(), vec![1]);
    }
}
